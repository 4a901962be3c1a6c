use crate::{Generator, GeneratorError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Length of every generated token, in characters.
pub const TOKEN_LENGTH: usize = 8;

// 6 random bytes encode to exactly TOKEN_LENGTH base64 characters.
const RANDOM_BYTES: usize = 6;

/// Stateless generator drawing tokens from the OS CSPRNG.
///
/// Tokens are 8 characters from the URL-safe base64 alphabet
/// (`[A-Za-z0-9_-]`, no `/`, `+`, or `=`), giving 48 bits of randomness
/// per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> Result<String, GeneratorError> {
        let mut bytes = [0u8; RANDOM_BYTES];
        getrandom::fill(&mut bytes)
            .map_err(|e| GeneratorError::RandomnessUnavailable(e.to_string()))?;

        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
