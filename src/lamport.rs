use std::fmt;

use digest::{Digest, Output};
use log::{debug, trace};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::bits::Branch;
use crate::error::{Error, Result};

/// Number of digest bits, which is also the number of blocks per branch.
pub(crate) fn bits<D: Digest>() -> usize {
    8 * <D as Digest>::output_size()
}

/// Width of a single key or signature block in bytes.
pub(crate) fn block_len<D: Digest>() -> usize {
    <D as Digest>::output_size()
}

/// Serialized size of a private or public key.
pub(crate) fn key_len<D: Digest>() -> usize {
    2 * bits::<D>() * block_len::<D>()
}

/// Serialized size of a signature.
pub(crate) fn signature_len<D: Digest>() -> usize {
    bits::<D>() * block_len::<D>()
}

fn hash<D: Digest>(bytes: &[u8]) -> Output<D> {
    D::digest(bytes)
}

fn blocks_of<D: Digest>(bytes: &[u8]) -> Vec<Output<D>> {
    bytes
        .chunks_exact(block_len::<D>())
        .map(|chunk| Output::<D>::clone_from_slice(chunk))
        .collect()
}

fn split_branches<D: Digest>(bytes: &[u8]) -> Result<(Vec<Output<D>>, Vec<Output<D>>)> {
    let expected = key_len::<D>();
    if bytes.len() != expected {
        return Err(Error::MalformedKey {
            expected,
            actual: bytes.len(),
        });
    }
    let (zero, one) = bytes.split_at(expected / 2);
    Ok((blocks_of::<D>(zero), blocks_of::<D>(one)))
}

/// A private key is what you generate and keep in order to sign exactly
/// one message. From it, you can generate a [`PublicKey`] and send that to
/// others, allowing them to verify your signature down the line.
///
/// Signing consumes the key, and the key material is zeroized whenever a
/// `PrivateKey` is dropped.
pub struct PrivateKey<D: Digest> {
    zero: Vec<Output<D>>,
    one: Vec<Output<D>>,
}

impl<D: Digest> PrivateKey<D> {
    /// Generates a new private key using the operating system random
    /// number generator.
    pub fn generate() -> Result<PrivateKey<D>> {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Generates a new private key, drawing every block from `rng`.
    ///
    /// If `rng` fails part way through, the blocks drawn so far are
    /// zeroized and the error is returned.
    pub fn generate_with_rng<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
    ) -> Result<PrivateKey<D>> {
        let bits = bits::<D>();
        debug!(
            "generating lamport private key: 2 x {} blocks of {} bytes",
            bits,
            block_len::<D>()
        );
        let mut private_key = PrivateKey {
            zero: Vec::with_capacity(bits),
            one: Vec::with_capacity(bits),
        };
        for blocks in [&mut private_key.zero, &mut private_key.one] {
            for _ in 0..bits {
                let mut block = Output::<D>::default();
                let filled = rng.try_fill_bytes(block.as_mut_slice());
                blocks.push(block);
                filled?;
            }
        }
        Ok(private_key)
    }

    /// Builds a private key from its two branches, each of which must hold
    /// exactly one block per digest bit.
    pub fn from_blocks(zero: Vec<Output<D>>, one: Vec<Output<D>>) -> Result<PrivateKey<D>> {
        let private_key = PrivateKey { zero, one };
        let bits = bits::<D>();
        if private_key.zero.len() != bits || private_key.one.len() != bits {
            return Err(Error::MalformedKey {
                expected: key_len::<D>(),
                actual: (private_key.zero.len() + private_key.one.len()) * block_len::<D>(),
            });
        }
        Ok(private_key)
    }

    /// Creates the [`PublicKey`] associated with this [`PrivateKey`].
    pub fn public_key(&self) -> PublicKey<D> {
        PublicKey {
            zero: self.zero.iter().map(|block| hash::<D>(block)).collect(),
            one: self.one.iter().map(|block| hash::<D>(block)).collect(),
        }
    }

    /// Signs the message, producing a [`Signature`] which another party would
    /// be able to [`PublicKey::verify`] with access to the [`PublicKey`] generated
    /// from this [`PrivateKey`] with [`PrivateKey::public_key`].
    ///
    /// The key is consumed: revealing blocks for a second message would let
    /// an observer forge signatures.
    pub fn sign<A: AsRef<[u8]>>(self, message: A) -> Signature<D> {
        let digest = hash::<D>(message.as_ref());
        trace!("signing {} byte message", message.as_ref().len());
        let blocks = (0..bits::<D>())
            .map(|i| self.branch(Branch::for_position(&digest, i))[i].clone())
            .collect();
        Signature { blocks }
    }

    /// Serializes the key as all zero-branch blocks followed by all
    /// one-branch blocks.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(key_len::<D>()));
        for block in self.zero.iter().chain(self.one.iter()) {
            out.extend_from_slice(block);
        }
        out
    }

    fn branch(&self, branch: Branch) -> &[Output<D>] {
        match branch {
            Branch::Zero => &self.zero,
            Branch::One => &self.one,
        }
    }
}

impl<D: Digest> TryFrom<&[u8]> for PrivateKey<D> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let (zero, one) = split_branches::<D>(bytes)?;
        Ok(PrivateKey { zero, one })
    }
}

impl<D: Digest> Zeroize for PrivateKey<D> {
    fn zeroize(&mut self) {
        for block in self.zero.iter_mut().chain(self.one.iter_mut()) {
            block.as_mut_slice().zeroize();
        }
    }
}

impl<D: Digest> Drop for PrivateKey<D> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<D: Digest> ZeroizeOnDrop for PrivateKey<D> {}

impl<D: Digest> fmt::Debug for PrivateKey<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &bits::<D>())
            .finish_non_exhaustive()
    }
}

/// The public key associated with a given [`PrivateKey`], allowing any
/// owner to [`PublicKey::verify`] a [`Signature`] produced by that
/// [`PrivateKey`].
pub struct PublicKey<D: Digest> {
    zero: Vec<Output<D>>,
    one: Vec<Output<D>>,
}

impl<D: Digest> PublicKey<D> {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.into()
    }

    /// The digest stored for `branch` at position `index`, if `index` is
    /// below the digest width.
    pub fn block(&self, branch: Branch, index: usize) -> Option<&Output<D>> {
        self.branch(branch).get(index)
    }

    pub fn verify<A: AsRef<[u8]>>(&self, message: A, signature: &Signature<D>) -> bool {
        let digest = hash::<D>(message.as_ref());
        trace!("verifying {} byte message", message.as_ref().len());
        if signature.blocks.len() != bits::<D>() {
            debug!("rejecting signature of {} blocks", signature.blocks.len());
            return false;
        }
        signature.blocks.iter().enumerate().all(|(i, revealed)| {
            let expected = &self.branch(Branch::for_position(&digest, i))[i];
            hash::<D>(revealed).as_slice().ct_eq(expected.as_slice()).into()
        })
    }

    fn branch(&self, branch: Branch) -> &[Output<D>] {
        match branch {
            Branch::Zero => &self.zero,
            Branch::One => &self.one,
        }
    }
}

impl<D: Digest> TryFrom<&[u8]> for PublicKey<D> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let (zero, one) = split_branches::<D>(bytes)?;
        Ok(PublicKey { zero, one })
    }
}

impl<D: Digest> From<&PublicKey<D>> for Vec<u8> {
    fn from(public_key: &PublicKey<D>) -> Self {
        let mut out = Vec::with_capacity(key_len::<D>());
        for block in public_key.zero.iter().chain(public_key.one.iter()) {
            out.extend_from_slice(block);
        }
        out
    }
}

impl<D: Digest> Clone for PublicKey<D> {
    fn clone(&self) -> Self {
        PublicKey {
            zero: self.zero.clone(),
            one: self.one.clone(),
        }
    }
}

impl<D: Digest> PartialEq for PublicKey<D> {
    fn eq(&self, other: &Self) -> bool {
        self.zero == other.zero && self.one == other.one
    }
}

impl<D: Digest> Eq for PublicKey<D> {}

impl<D: Digest> fmt::Debug for PublicKey<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("zero", &self.zero)
            .field("one", &self.one)
            .finish()
    }
}

/// The result of [`PrivateKey::sign`]ing a message. Can be verified
/// to be from the [`PrivateKey`] associated with a [`PublicKey`]
/// if you have that public key, the message, along with the signature.
pub struct Signature<D: Digest> {
    blocks: Vec<Output<D>>,
}

impl<D: Digest> Signature<D> {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.into()
    }

    /// The revealed private key blocks, in digest bit order.
    pub fn blocks(&self) -> &[Output<D>] {
        &self.blocks
    }
}

impl<D: Digest> TryFrom<&[u8]> for Signature<D> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let expected = signature_len::<D>();
        if bytes.len() != expected {
            return Err(Error::MalformedSignature {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Signature {
            blocks: blocks_of::<D>(bytes),
        })
    }
}

impl<D: Digest> From<&Signature<D>> for Vec<u8> {
    fn from(signature: &Signature<D>) -> Self {
        let mut out = Vec::with_capacity(signature_len::<D>());
        for block in signature.blocks.iter() {
            out.extend_from_slice(block);
        }
        out
    }
}

impl<D: Digest> Clone for Signature<D> {
    fn clone(&self) -> Self {
        Signature {
            blocks: self.blocks.clone(),
        }
    }
}

impl<D: Digest> PartialEq for Signature<D> {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl<D: Digest> Eq for Signature<D> {}

impl<D: Digest> fmt::Debug for Signature<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("blocks", &self.blocks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use sha2::Sha256;

    fn seeded_key(seed: u64) -> PrivateKey<Sha256> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        PrivateKey::generate_with_rng(&mut rng).unwrap()
    }

    #[test]
    fn end_to_end() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let private = PrivateKey::<Sha256>::generate()?;
        let public_key = private.public_key();
        let message = b"Hello, world!";

        let signature = private.sign(message);
        assert!(public_key.verify(message, &signature));

        let faulty_message = b"Hello, not world!";
        assert!(!public_key.verify(faulty_message, &signature));

        let other = PrivateKey::<Sha256>::generate()?;
        let other_public_key = other.public_key();
        let faulty_signature = other.sign(message);
        assert!(!public_key.verify(message, &faulty_signature));
        assert!(other_public_key.verify(message, &faulty_signature));
        Ok(())
    }

    #[test]
    fn public_key_hashes_every_block() {
        let private = seeded_key(1);
        let public_key = private.public_key();
        for i in 0..256 {
            assert_eq!(
                public_key.block(Branch::Zero, i),
                Some(&Sha256::digest(private.zero[i]))
            );
            assert_eq!(
                public_key.block(Branch::One, i),
                Some(&Sha256::digest(private.one[i]))
            );
        }
        assert_eq!(public_key.block(Branch::One, 256), None);
    }

    #[test]
    fn signature_reveals_branch_selected_by_digest() {
        let private = seeded_key(2);
        let expected: Vec<Output<Sha256>> = {
            let digest = Sha256::digest(b"lamport");
            (0..256)
                .map(|i| match Branch::for_position(&digest, i) {
                    Branch::Zero => private.zero[i],
                    Branch::One => private.one[i],
                })
                .collect()
        };
        let signature = private.sign(b"lamport");
        assert_eq!(signature.blocks(), expected.as_slice());
    }

    #[test]
    fn signing_is_deterministic() {
        let first = seeded_key(3).sign(b"same message");
        let second = seeded_key(3).sign(b"same message");
        assert_eq!(first, second);
    }

    #[test]
    fn sizes() {
        let private = seeded_key(4);
        let public_key = private.public_key();
        assert_eq!(private.to_bytes().len(), 256 * 32 * 2);
        assert_eq!(public_key.to_bytes().len(), 256 * 32 * 2);
        assert_eq!(private.sign(b"x").to_bytes().len(), 256 * 32);
    }

    #[test]
    fn byte_layout_is_branch_major() {
        let private = seeded_key(5);
        let bytes = private.to_bytes();
        assert_eq!(&bytes[..32], private.zero[0].as_slice());
        assert_eq!(&bytes[255 * 32..256 * 32], private.zero[255].as_slice());
        assert_eq!(&bytes[256 * 32..257 * 32], private.one[0].as_slice());
        assert_eq!(&bytes[bytes.len() - 32..], private.one[255].as_slice());
    }

    #[test]
    fn keys_survive_serialization() -> Result<()> {
        let private = seeded_key(6);
        let public_key = PublicKey::<Sha256>::try_from(private.public_key().to_bytes().as_slice())?;
        let restored = PrivateKey::<Sha256>::try_from(private.to_bytes().as_slice())?;
        drop(private);

        let signature = restored.sign(b"restored");
        let signature = Signature::<Sha256>::try_from(signature.to_bytes().as_slice())?;
        assert!(public_key.verify(b"restored", &signature));
        Ok(())
    }

    #[test]
    fn shifted_bytes_do_not_verify() -> Result<()> {
        let private = seeded_key(7);
        let public_key = private.public_key();
        let mut bytes = private.sign(b"shift").to_bytes();
        bytes.rotate_left(1);
        let shifted = Signature::<Sha256>::try_from(bytes.as_slice())?;
        assert!(!public_key.verify(b"shift", &shifted));
        Ok(())
    }

    #[test]
    fn rejects_wrong_lengths() {
        let short = vec![0u8; 256 * 32 * 2 - 1];
        assert!(matches!(
            PrivateKey::<Sha256>::try_from(short.as_slice()),
            Err(Error::MalformedKey {
                expected: 16384,
                actual: 16383
            })
        ));
        assert!(matches!(
            PublicKey::<Sha256>::try_from(&short[..32]),
            Err(Error::MalformedKey { .. })
        ));
        assert!(matches!(
            Signature::<Sha256>::try_from(&short[..256 * 32 + 1]),
            Err(Error::MalformedSignature {
                expected: 8192,
                actual: 8193
            })
        ));
    }

    #[test]
    fn short_signature_does_not_verify() {
        let private = seeded_key(10);
        let public_key = private.public_key();
        let mut signature = private.sign(b"short");
        assert!(public_key.verify(b"short", &signature));

        signature.blocks.truncate(255);
        assert!(!public_key.verify(b"short", &signature));
        signature.blocks.clear();
        assert!(!public_key.verify(b"short", &signature));
    }

    #[test]
    fn from_blocks_checks_block_counts() {
        let block = Output::<Sha256>::default();
        assert!(matches!(
            PrivateKey::<Sha256>::from_blocks(vec![block; 256], vec![block; 255]),
            Err(Error::MalformedKey {
                expected: 16384,
                actual: 16352
            })
        ));
        assert!(PrivateKey::<Sha256>::from_blocks(vec![block; 256], vec![block; 256]).is_ok());
    }

    #[test]
    fn zeroize_clears_key_material() {
        let mut private = seeded_key(8);
        private.zeroize();
        assert!(private.to_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn debug_hides_key_material() {
        let private = seeded_key(9);
        assert_eq!(format!("{:?}", private), "PrivateKey { bits: 256, .. }");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 999, .. ProptestConfig::default()
        })]

        #[test]
        fn really_works(s in "\\PC*") {
            let private = PrivateKey::<Sha256>::generate()?;
            let public_key = private.public_key();
            let message = s.as_bytes();

            let signature = private.sign(message);
            prop_assert!(public_key.verify(message, &signature));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256, .. ProptestConfig::default()
        })]

        #[test]
        fn flipped_bit_does_not_verify(
            message in proptest::collection::vec(any::<u8>(), 1..256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let private = PrivateKey::<Sha256>::generate()?;
            let public_key = private.public_key();
            let signature = private.sign(&message);

            let mut tampered = message.clone();
            tampered[position.index(message.len())] ^= 1 << bit;
            prop_assert!(!public_key.verify(&tampered, &signature));
        }
    }
}
