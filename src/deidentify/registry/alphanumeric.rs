//! Shape-preserving random substitution for free-form identifiers

use super::{TransformOptions, ValueTransformer};
use anyhow::Result;
use rand::Rng;

/// Replaces letters with random letters of the same case and digits with random digits
///
/// Punctuation and whitespace are kept, so the substitute has the same shape
/// as the original (useful for names and alphanumeric codes).
pub struct RandomAlphanumericSubstitution;

impl ValueTransformer for RandomAlphanumericSubstitution {
    fn name(&self) -> &'static str {
        "random_alphanumeric_substitution"
    }

    fn transform(&self, original: &str, _options: &TransformOptions) -> Result<String> {
        let mut rng = rand::thread_rng();
        Ok(original
            .chars()
            .map(|c| match c {
                'a'..='z' => char::from(b'a' + rng.gen_range(0..26u8)),
                'A'..='Z' => char::from(b'A' + rng.gen_range(0..26u8)),
                '0'..='9' => char::from(b'0' + rng.gen_range(0..10u8)),
                other => other,
            })
            .collect())
    }
}
