//! # Contract Events
//!
//! The closed set of contract events the follower understands, with ABI
//! decoding from raw logs and the matching encoders used by the mock
//! execution client in tests.

use primitive_types::U256;
use shared_types::{keccak256, Address, Hash, Log};

use super::errors::ChainFollowerError;

/// A decoded contract event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractEvent {
    /// A new keyper set was scheduled on the keyper-set manager.
    KeyperSetAdded(KeyperSetAddedEvent),
    /// An eon public key was broadcast on the key-broadcast contract.
    EonKeyBroadcast(EonKeyBroadcastEvent),
    /// An encrypted transaction was submitted to the sequencer.
    TransactionSubmitted(TransactionSubmittedEvent),
    /// A validator registration message was posted to the registry.
    ValidatorRegistryUpdated(ValidatorRegistryUpdatedEvent),
}

/// `KeyperSetAdded(uint64 activationBlock, address keyperSetContract)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyperSetAddedEvent {
    /// First block at which the new set is active.
    pub activation_block_number: u64,
    /// Address of the per-set contract holding members and threshold.
    pub keyper_set_contract: Address,
    /// Block containing the event; member data is read at this block.
    pub block_hash: Hash,
    /// Number of the block containing the event.
    pub block_number: u64,
}

/// `EonKeyBroadcast(uint64 eon, bytes key)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EonKeyBroadcastEvent {
    /// Eon the key belongs to.
    pub eon: u64,
    /// Serialized eon public key.
    pub key: Vec<u8>,
    /// Block containing the event.
    pub block_hash: Hash,
    /// Number of the block containing the event.
    pub block_number: u64,
}

/// `TransactionSubmitted(uint64 eon, bytes32 identityPrefix, address sender,
/// bytes encryptedTransaction, uint256 gasLimit)`.
///
/// `gas_limit` stays a `U256` here; the range guard happens where the event
/// is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionSubmittedEvent {
    /// Eon the submission belongs to.
    pub eon: u64,
    /// 32-byte identity prefix chosen by the submitter.
    pub identity_prefix: [u8; 32],
    /// Submitting account.
    pub sender: Address,
    /// Opaque encrypted transaction payload.
    pub encrypted_transaction: Vec<u8>,
    /// Declared gas limit of the encrypted transaction.
    pub gas_limit: U256,
    /// Block containing the event.
    pub block_hash: Hash,
    /// Number of the block containing the event.
    pub block_number: u64,
    /// Transaction index within the block.
    pub tx_index: u64,
    /// Log index within the block.
    pub log_index: u64,
}

/// `Updated(bytes message, bytes signature)` on the validator registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorRegistryUpdatedEvent {
    /// Packed registration message.
    pub message: Vec<u8>,
    /// Signature over the message.
    pub signature: Vec<u8>,
    /// Block containing the event.
    pub block_hash: Hash,
    /// Number of the block containing the event.
    pub block_number: u64,
}

impl KeyperSetAddedEvent {
    /// Event signature topic.
    pub fn topic() -> Hash {
        keccak256(b"KeyperSetAdded(uint64,address)")
    }

    /// Decode from a raw log.
    pub fn decode(log: &Log) -> Result<Self, ChainFollowerError> {
        Ok(Self {
            activation_block_number: decode_u64(word(&log.data, 0)?)?,
            keyper_set_contract: decode_address(word(&log.data, 1)?),
            block_hash: log.block_hash,
            block_number: log.block_number,
        })
    }

    /// ABI-encode the data section.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(&u64_word(self.activation_block_number));
        data.extend_from_slice(&address_word(&self.keyper_set_contract));
        data
    }

    /// Build a raw log for this event, as emitted by `contract`.
    pub fn into_log(self, contract: Address) -> Log {
        Log {
            address: contract,
            topics: vec![Self::topic()],
            data: self.abi_encode(),
            block_hash: self.block_hash,
            block_number: self.block_number,
            tx_index: 0,
            log_index: 0,
        }
    }
}

impl EonKeyBroadcastEvent {
    /// Event signature topic.
    pub fn topic() -> Hash {
        keccak256(b"EonKeyBroadcast(uint64,bytes)")
    }

    /// Decode from a raw log.
    pub fn decode(log: &Log) -> Result<Self, ChainFollowerError> {
        Ok(Self {
            eon: decode_u64(word(&log.data, 0)?)?,
            key: decode_bytes(&log.data, 1)?,
            block_hash: log.block_hash,
            block_number: log.block_number,
        })
    }

    /// ABI-encode the data section.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&u64_word(self.eon));
        data.extend_from_slice(&u64_word(64)); // offset of the bytes tail
        append_bytes_tail(&mut data, &self.key);
        data
    }

    /// Build a raw log for this event, as emitted by `contract`.
    pub fn into_log(self, contract: Address) -> Log {
        Log {
            address: contract,
            topics: vec![Self::topic()],
            data: self.abi_encode(),
            block_hash: self.block_hash,
            block_number: self.block_number,
            tx_index: 0,
            log_index: 0,
        }
    }
}

impl TransactionSubmittedEvent {
    /// Event signature topic.
    pub fn topic() -> Hash {
        keccak256(b"TransactionSubmitted(uint64,bytes32,address,bytes,uint256)")
    }

    /// Decode from a raw log.
    pub fn decode(log: &Log) -> Result<Self, ChainFollowerError> {
        Ok(Self {
            eon: decode_u64(word(&log.data, 0)?)?,
            identity_prefix: word(&log.data, 1)?,
            sender: decode_address(word(&log.data, 2)?),
            encrypted_transaction: decode_bytes(&log.data, 3)?,
            gas_limit: U256::from_big_endian(&word(&log.data, 4)?),
            block_hash: log.block_hash,
            block_number: log.block_number,
            tx_index: log.tx_index,
            log_index: log.log_index,
        })
    }

    /// ABI-encode the data section.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&u64_word(self.eon));
        data.extend_from_slice(&self.identity_prefix);
        data.extend_from_slice(&address_word(&self.sender));
        data.extend_from_slice(&u64_word(160)); // offset of the bytes tail
        data.extend_from_slice(&u256_word(self.gas_limit));
        append_bytes_tail(&mut data, &self.encrypted_transaction);
        data
    }

    /// Build a raw log for this event, as emitted by `contract`.
    pub fn into_log(self, contract: Address) -> Log {
        Log {
            address: contract,
            topics: vec![Self::topic()],
            data: self.abi_encode(),
            block_hash: self.block_hash,
            block_number: self.block_number,
            tx_index: self.tx_index,
            log_index: self.log_index,
        }
    }
}

impl ValidatorRegistryUpdatedEvent {
    /// Event signature topic.
    pub fn topic() -> Hash {
        keccak256(b"Updated(bytes,bytes)")
    }

    /// Decode from a raw log.
    pub fn decode(log: &Log) -> Result<Self, ChainFollowerError> {
        Ok(Self {
            message: decode_bytes(&log.data, 0)?,
            signature: decode_bytes(&log.data, 1)?,
            block_hash: log.block_hash,
            block_number: log.block_number,
        })
    }

    /// ABI-encode the data section.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let message_tail = 64;
        let signature_tail = message_tail + 32 + padded_len(self.message.len());
        data.extend_from_slice(&u64_word(message_tail as u64));
        data.extend_from_slice(&u64_word(signature_tail as u64));
        append_bytes_tail(&mut data, &self.message);
        append_bytes_tail(&mut data, &self.signature);
        data
    }

    /// Build a raw log for this event, as emitted by `contract`.
    pub fn into_log(self, contract: Address) -> Log {
        Log {
            address: contract,
            topics: vec![Self::topic()],
            data: self.abi_encode(),
            block_hash: self.block_hash,
            block_number: self.block_number,
            tx_index: 0,
            log_index: 0,
        }
    }
}

// =============================================================================
// ABI helpers
// =============================================================================

fn word(data: &[u8], index: usize) -> Result<[u8; 32], ChainFollowerError> {
    let start = index * 32;
    let slice = data.get(start..start + 32).ok_or_else(|| {
        ChainFollowerError::Decode(format!("data too short for word {index}"))
    })?;
    let mut word = [0u8; 32];
    word.copy_from_slice(slice);
    Ok(word)
}

fn decode_u64(word: [u8; 32]) -> Result<u64, ChainFollowerError> {
    let value = U256::from_big_endian(&word);
    if value > U256::from(u64::MAX) {
        return Err(ChainFollowerError::Decode(
            "uint64 field exceeds 64 bits".into(),
        ));
    }
    Ok(value.low_u64())
}

fn decode_address(word: [u8; 32]) -> Address {
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    address
}

fn decode_bytes(data: &[u8], head_word: usize) -> Result<Vec<u8>, ChainFollowerError> {
    let offset = decode_u64(word(data, head_word)?)? as usize;
    // The offset and length words are attacker-controlled; the additions
    // must not wrap.
    let length_end = offset
        .checked_add(32)
        .ok_or_else(|| ChainFollowerError::Decode("bytes offset out of range".into()))?;
    let length_word = data.get(offset..length_end).ok_or_else(|| {
        ChainFollowerError::Decode("bytes offset out of range".into())
    })?;
    let mut length_bytes = [0u8; 32];
    length_bytes.copy_from_slice(length_word);
    let length = decode_u64(length_bytes)? as usize;
    let payload_end = length_end
        .checked_add(length)
        .ok_or_else(|| ChainFollowerError::Decode("bytes payload out of range".into()))?;
    data.get(length_end..payload_end)
        .map(|b| b.to_vec())
        .ok_or_else(|| ChainFollowerError::Decode("bytes payload out of range".into()))
}

fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

fn append_bytes_tail(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&u64_word(bytes.len() as u64));
    data.extend_from_slice(bytes);
    data.resize(data.len() + padded_len(bytes.len()) - bytes.len(), 0);
}
