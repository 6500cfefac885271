use super::TokenId;

/// Fits a token sequence to the model's context window. Oversized input
/// keeps the most recent `window` tokens; undersized input is left-padded
/// with `pad_id` so the real tokens stay adjacent to the prediction
/// boundary. The result is always exactly `window` long.
pub fn normalize(tokens: &[TokenId], window: usize, pad_id: TokenId) -> Vec<TokenId> {
    if tokens.len() >= window {
        tokens[tokens.len() - window..].to_vec()
    } else {
        let mut normalized = vec![pad_id; window - tokens.len()];
        normalized.extend_from_slice(tokens);
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 512;

    #[test]
    fn always_returns_exactly_window_tokens() {
        for len in [0, 1, W - 1, W, W + 1, 10 * W] {
            let tokens: Vec<TokenId> = (0..len as TokenId).collect();
            assert_eq!(normalize(&tokens, W, 1).len(), W);
        }
    }

    #[test]
    fn truncation_keeps_the_most_recent_tokens() {
        let tokens: Vec<TokenId> = (1..=1000).collect();
        assert_eq!(normalize(&tokens, W, 0), (489..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn padding_prepends_the_sentinel() {
        assert_eq!(normalize(&[10, 12, 14], 5, 1), vec![1, 1, 10, 12, 14]);
    }

    #[test]
    fn empty_input_is_all_padding() {
        assert_eq!(normalize(&[], W, 1), vec![1; W]);
    }

    #[test]
    fn exact_length_is_identity() {
        let tokens: Vec<TokenId> = (0..W as TokenId).collect();
        assert_eq!(normalize(&tokens, W, 1), tokens);
    }

    #[test]
    fn idempotent() {
        let tokens: Vec<TokenId> = (0..37).collect();
        let once = normalize(&tokens, W, 1);
        assert_eq!(normalize(&once, W, 1), once);
    }
}
