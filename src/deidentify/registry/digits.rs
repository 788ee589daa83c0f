//! Digit-preserving random substitution

use super::{TransformOptions, ValueTransformer};
use anyhow::Result;
use rand::Rng;

/// Digits a value is padded up to when no option is given
pub const DEFAULT_PADDED_LENGTH: usize = 10;

/// Replaces each digit with a uniformly random digit
///
/// Non-digit characters stay in place. When the value holds fewer digits than
/// `padded_length`, random digits are appended until it does, so short codes
/// do not collide or get guessed trivially.
pub struct RandomNumberSubstitution;

impl RandomNumberSubstitution {
    fn substitute<R: Rng + ?Sized>(rng: &mut R, code: &str, padded_length: usize) -> String {
        let mut output: String = code
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    random_digit(rng)
                } else {
                    c
                }
            })
            .collect();

        let n_digits = code.chars().filter(char::is_ascii_digit).count();
        for _ in n_digits..padded_length {
            output.push(random_digit(rng));
        }
        output
    }
}

fn random_digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10u8))
}

impl ValueTransformer for RandomNumberSubstitution {
    fn name(&self) -> &'static str {
        "random_number_substitution"
    }

    fn transform(&self, original: &str, options: &TransformOptions) -> Result<String> {
        let padded_length = options.get_usize("padded_length", DEFAULT_PADDED_LENGTH)?;
        Ok(Self::substitute(
            &mut rand::thread_rng(),
            original,
            padded_length,
        ))
    }
}
