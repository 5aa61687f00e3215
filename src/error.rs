use thiserror::Error;

/// Everything that can go wrong while generating keys or signing.
///
/// Verification has no error path: a malformed or forged input simply
/// does not verify.
#[derive(Debug, Error)]
pub enum Error {
    /// The secure random source could not supply key material. No key
    /// pair is produced when this happens.
    #[error("secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),

    /// Key material did not have exactly two branches of one block per
    /// digest bit. Sizes are in bytes.
    #[error("malformed key: expected {expected} bytes, got {actual}")]
    MalformedKey { expected: usize, actual: usize },

    /// A signature did not have exactly one block per digest bit. Sizes
    /// are in bytes.
    #[error("malformed signature: expected {expected} bytes, got {actual}")]
    MalformedSignature { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
