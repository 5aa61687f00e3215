/// One of the two parallel block sequences making up a Lamport key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Branch {
    Zero,
    One,
}

impl Branch {
    /// The branch revealed for signature position `index` when signing
    /// a message whose digest is `digest`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `8 * digest.len()`.
    pub fn for_position(digest: &[u8], index: usize) -> Branch {
        if digest_bit(digest, index) {
            Branch::One
        } else {
            Branch::Zero
        }
    }
}

/// Bit `index` of `digest` read as a big-endian unsigned integer, so bit 0
/// is the least significant bit of the last byte.
///
/// Every position is read from the unmodified digest; signer and verifier
/// must agree on this exactly or no signature will ever verify.
///
/// # Panics
///
/// Panics if `index` is not below `8 * digest.len()`.
pub(crate) fn digest_bit(digest: &[u8], index: usize) -> bool {
    let byte = digest[digest.len() - 1 - index / 8];
    bit_of_byte(index % 8, byte)
}

fn bitmask_for(index: usize) -> u8 {
    match index {
        0 => 0b00000001,
        1 => 0b00000010,
        2 => 0b00000100,
        3 => 0b00001000,
        4 => 0b00010000,
        5 => 0b00100000,
        6 => 0b01000000,
        7 => 0b10000000,
        _ => bitmask_for(index % 8),
    }
}

fn bit_of_byte(index: usize, byte: u8) -> bool {
    let mask = bitmask_for(index);
    byte & mask == mask
}

#[test]
fn test_bit_of_byte() {
    assert!(bit_of_byte(0, 0b00000001));
    assert!(!bit_of_byte(0, 0b00000010));
    assert!(bit_of_byte(7, 0b10000000));
    assert!(!bit_of_byte(7, 0b01111111));
}
