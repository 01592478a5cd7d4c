//! # Wire Messages
//!
//! The P2P messages the middleware touches, with stable field order for
//! `bincode` wire encoding. The share/key payloads themselves are opaque
//! threshold-cryptography material.

use serde::{Deserialize, Serialize};
use shared_types::{hash_identities, Hash, IdentityPreimage};

use super::errors::MessagingError;

/// One keyper's decryption key share for a single identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShare {
    /// Identity the share belongs to.
    pub identity_preimage: IdentityPreimage,
    /// Opaque share material.
    pub share: Vec<u8>,
}

/// Slot metadata attached to outgoing `DecryptionKeyShares`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesExtra {
    /// Slot the shares belong to.
    pub slot: u64,
    /// Tx pointer the identity selection started from.
    pub tx_pointer: u64,
    /// This keyper's 65-byte slot signature.
    pub signature: Vec<u8>,
}

/// A keyper's shares for every identity of one slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionKeyShares {
    /// Protocol instance identifier.
    pub instance_id: u64,
    /// Eon of the shares.
    pub eon: u64,
    /// Index of the sending keyper within the set.
    pub keyper_index: u64,
    /// Shares, ordered by identity preimage.
    pub shares: Vec<KeyShare>,
    /// Slot metadata; absent until the middleware attaches it.
    pub extra: Option<SharesExtra>,
}

/// A reconstructed decryption key for a single identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionKey {
    /// Identity the key decrypts.
    pub identity_preimage: IdentityPreimage,
    /// Opaque key material.
    pub key: Vec<u8>,
}

/// Slot metadata attached to outgoing `DecryptionKeys`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysExtra {
    /// Slot the keys belong to.
    pub slot: u64,
    /// Tx pointer the identity selection started from.
    pub tx_pointer: u64,
    /// Indices of the attesting keypers, strictly increasing.
    pub signer_indices: Vec<u64>,
    /// One 65-byte slot signature per signer index.
    pub signatures: Vec<Vec<u8>>,
}

/// The reconstructed decryption keys of one slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionKeys {
    /// Protocol instance identifier.
    pub instance_id: u64,
    /// Eon of the keys.
    pub eon: u64,
    /// Keys, ordered by identity preimage.
    pub keys: Vec<DecryptionKey>,
    /// Slot metadata; absent until the middleware attaches it.
    pub extra: Option<KeysExtra>,
}

impl DecryptionKeyShares {
    /// The identity preimages covered by this message, in message order.
    pub fn identity_preimages(&self) -> Vec<IdentityPreimage> {
        self.shares
            .iter()
            .map(|s| s.identity_preimage.clone())
            .collect()
    }

    /// The identities hash implied by this message's share list.
    pub fn identities_hash(&self) -> Hash {
        hash_identities(&self.identity_preimages())
    }

    /// Wire-encode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessagingError> {
        bincode::serialize(self).map_err(|e| MessagingError::Decode(e.to_string()))
    }

    /// Decode from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError> {
        bincode::deserialize(bytes).map_err(|e| MessagingError::Decode(e.to_string()))
    }
}

impl DecryptionKeys {
    /// The identity preimages covered by this message, in message order.
    pub fn identity_preimages(&self) -> Vec<IdentityPreimage> {
        self.keys
            .iter()
            .map(|k| k.identity_preimage.clone())
            .collect()
    }

    /// The identities hash implied by this message's key list.
    pub fn identities_hash(&self) -> Hash {
        hash_identities(&self.identity_preimages())
    }

    /// Wire-encode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessagingError> {
        bincode::serialize(self).map_err(|e| MessagingError::Decode(e.to_string()))
    }

    /// Decode from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError> {
        bincode::deserialize(bytes).map_err(|e| MessagingError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_wire_round_trip() {
        let message = DecryptionKeys {
            instance_id: 42,
            eon: 1,
            keys: vec![DecryptionKey {
                identity_preimage: IdentityPreimage::from_slot(7),
                key: vec![1, 2, 3],
            }],
            extra: Some(KeysExtra {
                slot: 7,
                tx_pointer: 3,
                signer_indices: vec![0, 2],
                signatures: vec![vec![0xAA; 65], vec![0xBB; 65]],
            }),
        };
        let decoded = DecryptionKeys::from_bytes(&message.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_identities_hash_tracks_share_order() {
        let share = |slot: u64| KeyShare {
            identity_preimage: IdentityPreimage::from_slot(slot),
            share: vec![],
        };
        let a = DecryptionKeyShares {
            instance_id: 42,
            eon: 1,
            keyper_index: 0,
            shares: vec![share(1), share(2)],
            extra: None,
        };
        let b = DecryptionKeyShares {
            shares: vec![share(2), share(1)],
            ..a.clone()
        };
        assert_ne!(a.identities_hash(), b.identities_hash());
    }
}
