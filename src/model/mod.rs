mod generate;
mod normalize;

pub use generate::{GenerateError, PredictError, generate};
pub use normalize::normalize;

/// Opaque token identifier. What an ID means belongs to the external
/// tokenizer; this crate only moves them around.
pub type TokenId = u32;
