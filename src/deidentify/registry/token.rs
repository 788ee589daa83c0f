//! Opaque random token substitution

use super::{TransformOptions, ValueTransformer};
use anyhow::{bail, Result};
use rand::Rng;

/// Token length when no `length` option is given
pub const DEFAULT_TOKEN_LENGTH: usize = 16;

/// Replaces the value with a random lowercase hex token
///
/// Options: `length` (hex characters, default 16) and `prefix` (prepended
/// verbatim, e.g. `PT_`). The original value does not influence the output.
pub struct RandomToken;

impl ValueTransformer for RandomToken {
    fn name(&self) -> &'static str {
        "random_token"
    }

    fn transform(&self, _original: &str, options: &TransformOptions) -> Result<String> {
        let length = options.get_usize("length", DEFAULT_TOKEN_LENGTH)?;
        if length == 0 {
            bail!("option 'length' must be greater than zero");
        }
        let prefix = options.get_str("prefix")?.unwrap_or_default();

        let mut rng = rand::thread_rng();
        let mut token = String::with_capacity(prefix.len() + length);
        token.push_str(prefix);
        for _ in 0..length {
            let nibble = rng.gen_range(0..16u32);
            token.push(char::from_digit(nibble, 16).unwrap_or('0'));
        }
        Ok(token)
    }
}
