//! Short id generation for the Pinhole URL shortener.
//!
//! Generators are pure: they never consult storage, and they do not check
//! for collisions. Collision handling belongs to the store, which treats
//! a generated id like any other proposed short id.

pub mod random;

pub use random::RandomGenerator;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// The OS randomness source could not produce bytes. Fatal to the
    /// insertion attempt that asked for the id; never retried.
    #[error("randomness source unavailable: {0}")]
    RandomnessUnavailable(String),
}

/// Trait for producing short id tokens.
pub trait Generator: Send + Sync + 'static {
    /// Generates a fixed-length, URL-safe token. Each call is
    /// independent; statistical uniqueness is assumed, not verified.
    fn generate(&self) -> Result<String, GeneratorError>;
}
