//! # Slot Attestation Content
//!
//! The signed payload of a slot attestation and its recoverable ECDSA
//! signature scheme. The hash tree root is the only thing ever signed;
//! verification recovers the public key from the signature and compares
//! the derived address against the expected keyper.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use shared_types::{address_from_public_key, Address, Hash, IdentityPreimage};

use crate::algorithms::{chunk_u64, hash_preimage_leaf, merkleize, mix_in_length};
use crate::domain::SignatureError;

/// SSZ bound of the identity preimage list.
pub const MAX_NUM_PREIMAGES: usize = 1024;

/// Length of a recoverable signature: `r ‖ s ‖ recovery id`.
const SIGNATURE_LEN: usize = 65;

/// What a keyper signs when it releases decryption keys for a slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDecryptionSignatureData {
    /// Protocol instance identifier.
    pub instance_id: u64,
    /// Eon of the released keys.
    pub eon: u64,
    /// Attested slot.
    pub slot: u64,
    /// Tx pointer the identity selection started from.
    pub tx_pointer: u64,
    /// Ordered identity preimages the keys were released for.
    pub identity_preimages: Vec<IdentityPreimage>,
}

impl SlotDecryptionSignatureData {
    /// The SSZ hash tree root of the attestation content.
    pub fn hash_tree_root(&self) -> Result<Hash, SignatureError> {
        if self.identity_preimages.len() > MAX_NUM_PREIMAGES {
            return Err(SignatureError::TooManyPreimages(
                self.identity_preimages.len(),
            ));
        }
        let leaves: Vec<Hash> = self
            .identity_preimages
            .iter()
            .map(|p| hash_preimage_leaf(p.bytes()))
            .collect();
        let list_root = mix_in_length(
            &merkleize(&leaves, MAX_NUM_PREIMAGES),
            self.identity_preimages.len() as u64,
        );
        let fields = [
            chunk_u64(self.instance_id),
            chunk_u64(self.eon),
            chunk_u64(self.slot),
            chunk_u64(self.tx_pointer),
            list_root,
        ];
        Ok(merkleize(&fields, 8))
    }

    /// Sign the hash tree root, producing a 65-byte recoverable signature.
    pub fn sign(&self, key: &SigningKey) -> Result<Vec<u8>, SignatureError> {
        let root = self.hash_tree_root()?;
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&root)
            .map_err(|e| SignatureError::Ecdsa(e.to_string()))?;
        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.push(recovery_id.to_byte());
        Ok(bytes)
    }

    /// Whether `signature` is a valid attestation of this content by the
    /// keyper with address `signer`.
    pub fn verify(&self, signature: &[u8], signer: &Address) -> Result<bool, SignatureError> {
        let root = self.hash_tree_root()?;
        if signature.len() != SIGNATURE_LEN {
            return Err(SignatureError::MalformedSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                signature.len()
            )));
        }
        let parsed = Signature::from_slice(&signature[..64])
            .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(signature[64]).ok_or_else(|| {
            SignatureError::MalformedSignature("invalid recovery id".into())
        })?;
        let recovered = match VerifyingKey::recover_from_prehash(&root, &parsed, recovery_id) {
            Ok(key) => key,
            Err(_) => return Ok(false),
        };
        let public_key = recovered.to_encoded_point(false);
        Ok(&address_from_public_key(public_key.as_bytes()) == signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn sample_data() -> SlotDecryptionSignatureData {
        SlotDecryptionSignatureData {
            instance_id: 42,
            eon: 2,
            slot: 10_683_832,
            tx_pointer: 0,
            // 49 zero bytes followed by a3 05 b9.
            identity_preimages: vec![IdentityPreimage::from_slot(0x00A3_05B9)],
        }
    }

    fn keyper_address(key: &SigningKey) -> Address {
        let public_key = key.verifying_key().to_encoded_point(false);
        address_from_public_key(public_key.as_bytes())
    }

    #[test]
    fn test_hash_tree_root_reference_vector() {
        let root = sample_data().hash_tree_root().unwrap();
        assert_eq!(
            hex::encode(root),
            "ff9d6bfe29cce02e04471901e5c8a8c5e9c91fba43e580ded0bab41081b45f2a"
        );
    }

    #[test]
    fn test_root_depends_on_every_field() {
        let base = sample_data().hash_tree_root().unwrap();
        for data in [
            SlotDecryptionSignatureData {
                instance_id: 43,
                ..sample_data()
            },
            SlotDecryptionSignatureData {
                eon: 3,
                ..sample_data()
            },
            SlotDecryptionSignatureData {
                slot: 10_683_833,
                ..sample_data()
            },
            SlotDecryptionSignatureData {
                tx_pointer: 1,
                ..sample_data()
            },
            SlotDecryptionSignatureData {
                identity_preimages: vec![],
                ..sample_data()
            },
        ] {
            assert_ne!(data.hash_tree_root().unwrap(), base);
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let key = SigningKey::random(&mut OsRng);
        let data = sample_data();
        let signature = data.sign(&key).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LEN);
        assert!(data.verify(&signature, &keyper_address(&key)).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_signer() {
        let key = SigningKey::random(&mut OsRng);
        let other = SigningKey::random(&mut OsRng);
        let data = sample_data();
        let signature = data.sign(&key).unwrap();
        assert!(!data.verify(&signature, &keyper_address(&other)).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_content() {
        let key = SigningKey::random(&mut OsRng);
        let signature = sample_data().sign(&key).unwrap();
        let tampered = SlotDecryptionSignatureData {
            tx_pointer: 9,
            ..sample_data()
        };
        assert!(!tampered.verify(&signature, &keyper_address(&key)).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let data = sample_data();
        assert!(matches!(
            data.verify(&[0u8; 10], &[0u8; 20]),
            Err(SignatureError::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_preimage_list_bound() {
        let data = SlotDecryptionSignatureData {
            identity_preimages: vec![IdentityPreimage::from_slot(1); MAX_NUM_PREIMAGES + 1],
            ..sample_data()
        };
        assert!(matches!(
            data.hash_tree_root(),
            Err(SignatureError::TooManyPreimages(_))
        ));
    }
}
