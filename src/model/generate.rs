use thiserror::Error;

use super::TokenId;

/// Errors from the prediction call itself are opaque to this crate.
pub type PredictError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation count must be at least 1")]
    ZeroCount,
    #[error("context window must be at least 1")]
    ZeroWindow,
    #[error("seed is {got} tokens, the context window needs exactly {window}")]
    SeedLength { got: usize, window: usize },
    #[error("prediction failed at step {step}")]
    Prediction {
        step: usize,
        #[source]
        source: PredictError,
    },
    #[error("prediction at step {step} returned an empty distribution")]
    EmptyDistribution { step: usize },
    #[error("prediction at step {step} returned {got} probabilities, earlier steps returned {expected}")]
    VocabularyMismatch {
        step: usize,
        got: usize,
        expected: usize,
    },
    #[error("prediction at step {step} contains a non-finite probability")]
    NonFinite { step: usize },
}

/// Greedy autoregressive continuation. Starting from a `window`-sized seed,
/// each step feeds the trailing `window` tokens to `predict`, takes the
/// argmax of the returned distribution (ties to the lowest index, so
/// generation is reproducible) and appends it. Returns only the `count`
/// newly generated tokens.
///
/// A failing or malformed prediction aborts the whole run; a truncated
/// continuation is musically meaningless, so nothing partial is returned.
pub fn generate<F>(
    seed: &[TokenId],
    count: usize,
    window: usize,
    mut predict: F,
) -> Result<Vec<TokenId>, GenerateError>
where
    F: FnMut(&[TokenId]) -> Result<Vec<f32>, PredictError>,
{
    if count == 0 {
        return Err(GenerateError::ZeroCount);
    }
    if window == 0 {
        return Err(GenerateError::ZeroWindow);
    }
    if seed.len() != window {
        return Err(GenerateError::SeedLength {
            got: seed.len(),
            window,
        });
    }

    let mut buffer = seed.to_vec();
    let mut vocabulary = None;

    for step in 0..count {
        let context = &buffer[buffer.len() - window..];
        let probabilities =
            predict(context).map_err(|source| GenerateError::Prediction { step, source })?;

        if probabilities.is_empty() {
            return Err(GenerateError::EmptyDistribution { step });
        }
        match vocabulary {
            None => vocabulary = Some(probabilities.len()),
            Some(expected) if expected != probabilities.len() => {
                return Err(GenerateError::VocabularyMismatch {
                    step,
                    got: probabilities.len(),
                    expected,
                });
            }
            Some(_) => {}
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(GenerateError::NonFinite { step });
        }

        let mut best = 0;
        for (index, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = index;
            }
        }
        buffer.push(best as TokenId);
    }

    Ok(buffer[buffer.len() - count..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: usize = 32;

    /// Deterministic stub: argmax is always (last token + 1) mod VOCAB.
    fn successor(context: &[TokenId]) -> Result<Vec<f32>, PredictError> {
        let next = (context.last().copied().unwrap_or(0) as usize + 1) % VOCAB;
        let mut probs = vec![0.0; VOCAB];
        probs[next] = 1.0;
        Ok(probs)
    }

    #[test]
    fn produces_exactly_count_tokens() {
        let seed = vec![0; 8];
        for count in [1, 8, 100] {
            assert_eq!(generate(&seed, count, 8, successor).unwrap().len(), count);
        }
    }

    #[test]
    fn follows_the_trailing_window_at_each_step() {
        let seed: Vec<TokenId> = (0..8).collect();
        let out = generate(&seed, 40, 8, successor).unwrap();
        // seed ends at 7, so the continuation ramps 8, 9, ... mod VOCAB
        let expected: Vec<TokenId> = (0..40).map(|i| ((8 + i) % VOCAB as u32)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn ties_break_to_the_lowest_index() {
        let seed = vec![5; 4];
        let out = generate(&seed, 3, 4, |_| Ok(vec![0.25; 4])).unwrap();
        assert_eq!(out, vec![0, 0, 0]);
    }

    #[test]
    fn zero_count_is_rejected() {
        let seed = vec![0; 8];
        assert!(matches!(
            generate(&seed, 0, 8, successor),
            Err(GenerateError::ZeroCount)
        ));
    }

    #[test]
    fn seed_must_fill_the_window() {
        let seed = vec![0; 7];
        assert!(matches!(
            generate(&seed, 1, 8, successor),
            Err(GenerateError::SeedLength { got: 7, window: 8 })
        ));
    }

    #[test]
    fn prediction_failure_reports_the_step() {
        let seed = vec![0; 4];
        let result = generate(&seed, 10, 4, |context| {
            if context.last() == Some(&2) {
                Err("model went away".into())
            } else {
                successor(context)
            }
        });
        assert!(matches!(result, Err(GenerateError::Prediction { step: 2, .. })));
    }

    #[test]
    fn non_finite_probabilities_abort() {
        let seed = vec![0; 4];
        let result = generate(&seed, 5, 4, |_| Ok(vec![0.5, f32::NAN, 0.25]));
        assert!(matches!(result, Err(GenerateError::NonFinite { step: 0 })));
    }

    #[test]
    fn vocabulary_must_stay_stable_across_steps() {
        let seed = vec![0; 4];
        let mut calls = 0;
        let result = generate(&seed, 5, 4, |_| {
            calls += 1;
            Ok(vec![1.0; if calls == 1 { 8 } else { 9 }])
        });
        assert!(matches!(
            result,
            Err(GenerateError::VocabularyMismatch {
                step: 1,
                got: 9,
                expected: 8,
            })
        ));
    }
}
