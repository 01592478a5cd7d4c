//! Keccak-256, used for event topics, identities hashes and address
//! derivation.

use sha3::{Digest, Keccak256};

use crate::entities::{Address, Hash};

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Ethereum-style address of an uncompressed secp256k1 public key: the last
/// 20 bytes of the keccak hash of the key without its `0x04` tag byte.
pub fn address_from_public_key(uncompressed: &[u8]) -> Address {
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        // Well-known digest of the empty input.
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(keccak256(b"").to_vec(), expected);
    }

    #[test]
    fn test_keccak256_abc() {
        let expected =
            hex::decode("4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45")
                .unwrap();
        assert_eq!(keccak256(b"abc").to_vec(), expected);
    }
}
