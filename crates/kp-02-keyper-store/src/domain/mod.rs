//! Store row types and errors.

pub mod entities;
pub mod errors;

pub use entities::{
    CurrentDecryptionTrigger, SlotDecryptionSignature, StoredTransaction, SubmittedTransaction,
    SyncedUntil, TxPointer, ValidatorRegistration,
};
pub use errors::StoreError;
