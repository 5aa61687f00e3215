use std::fmt;
use std::marker::PhantomData;

use digest::Digest;
use log::debug;
use rand::{CryptoRng, RngCore};

use crate::error::Result;
use crate::lamport::{self, PrivateKey, PublicKey, Signature};

/// A Lamport one-time signature scheme over the digest `D`.
///
/// The digest fixes everything else: a digest of `W` bits gives keys of
/// `2·W` blocks and signatures of `W` blocks, each block `W/8` bytes wide.
pub struct Lamport<D> {
    digest: PhantomData<fn() -> D>,
}

impl<D: Digest> Lamport<D> {
    pub const fn new() -> Self {
        Lamport {
            digest: PhantomData,
        }
    }

    /// Digest width in bits.
    pub fn bits() -> usize {
        lamport::bits::<D>()
    }

    /// Width of one block in bytes.
    pub fn block_len() -> usize {
        lamport::block_len::<D>()
    }

    pub fn private_key_len() -> usize {
        lamport::key_len::<D>()
    }

    pub fn public_key_len() -> usize {
        lamport::key_len::<D>()
    }

    pub fn signature_len() -> usize {
        lamport::signature_len::<D>()
    }

    /// Generates a key pair from the operating system random number
    /// generator.
    pub fn generate_keypair(&self) -> Result<(PrivateKey<D>, PublicKey<D>)> {
        let private_key = PrivateKey::generate()?;
        let public_key = private_key.public_key();
        Ok((private_key, public_key))
    }

    /// Generates a key pair drawing key material from `rng`.
    pub fn generate_keypair_with_rng<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(PrivateKey<D>, PublicKey<D>)> {
        let private_key = PrivateKey::generate_with_rng(rng)?;
        let public_key = private_key.public_key();
        Ok((private_key, public_key))
    }

    /// Signs `message`, consuming the private key.
    pub fn sign<A: AsRef<[u8]>>(&self, message: A, private_key: PrivateKey<D>) -> Signature<D> {
        private_key.sign(message)
    }

    /// Signs `message` with a serialized private key.
    ///
    /// Fails with [`crate::Error::MalformedKey`] unless `private_key` is
    /// exactly [`Lamport::private_key_len`] bytes. The caller still owns
    /// `private_key` and must destroy it afterwards.
    pub fn sign_bytes<A: AsRef<[u8]>>(
        &self,
        message: A,
        private_key: &[u8],
    ) -> Result<Signature<D>> {
        let private_key = PrivateKey::<D>::try_from(private_key)?;
        Ok(private_key.sign(message))
    }

    pub fn verify<A: AsRef<[u8]>>(
        &self,
        message: A,
        signature: &Signature<D>,
        public_key: &PublicKey<D>,
    ) -> bool {
        public_key.verify(message, signature)
    }

    /// Verifies against a serialized signature and public key. Input of
    /// the wrong size does not verify.
    pub fn verify_bytes<A: AsRef<[u8]>>(
        &self,
        message: A,
        signature: &[u8],
        public_key: &[u8],
    ) -> bool {
        let Ok(signature) = Signature::<D>::try_from(signature) else {
            debug!("rejecting signature of {} bytes", signature.len());
            return false;
        };
        let Ok(public_key) = PublicKey::<D>::try_from(public_key) else {
            debug!("rejecting public key of {} bytes", public_key.len());
            return false;
        };
        public_key.verify(message, &signature)
    }
}

impl<D: Digest> Default for Lamport<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for Lamport<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Lamport<D> {}

impl<D: Digest> fmt::Debug for Lamport<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lamport")
            .field("bits", &Self::bits())
            .finish()
    }
}
