//! Lamport one-time signatures over any fixed-width hash function.
//!
//! A key pair signs exactly one message. The private key holds two
//! branches of random blocks, one block per digest bit; the public key is
//! the hash of every block; a signature reveals, for each bit of the
//! message digest, the block from the branch that bit selects.
//!
//! ```
//! use lamport_signatures::Sha256Lamport;
//!
//! let scheme = Sha256Lamport::new();
//! let (private_key, public_key) = scheme.generate_keypair()?;
//! let signature = scheme.sign(b"lamport", private_key);
//! assert!(scheme.verify(b"lamport", &signature, &public_key));
//! assert!(!scheme.verify(b"lamporT", &signature, &public_key));
//! # Ok::<(), lamport_signatures::Error>(())
//! ```
//!
//! Signing consumes the [`PrivateKey`], and dropping a private key
//! zeroizes it. Anything that copies key material out, such as
//! [`PrivateKey::to_bytes`], hands the one-time obligation to the caller.

mod bits;
mod error;
pub mod lamport;
mod scheme;

pub use bits::Branch;
pub use digest::Digest;
pub use error::{Error, Result};
pub use lamport::{PrivateKey, PublicKey, Signature};
pub use scheme::Lamport;

/// The reference construction: SHA-256, 256 bit digests.
pub type Sha256Lamport = Lamport<sha2::Sha256>;

/// Lamport signatures using the BLAKE3 hash function.
pub type Blake3Lamport = Lamport<blake3::Hasher>;
