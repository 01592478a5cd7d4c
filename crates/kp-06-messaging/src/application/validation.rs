//! # Inbound Validation
//!
//! The pubsub substrate calls these before handing a message to the keyper
//! core. Protocol violations are rejected; messages that merely do not fit
//! this node's current trigger state are ignored so the sender is not
//! punished for a timing difference.

use kp_05_slot_signature::SlotDecryptionSignatureData;
use shared_types::fits_i63;

use crate::application::middleware::MessagingMiddleware;
use crate::domain::{DecryptionKeyShares, DecryptionKeys, ValidationOutcome};

impl MessagingMiddleware {
    /// Validate an inbound share message against the recorded trigger.
    pub async fn validate_key_shares(
        &self,
        message: &DecryptionKeyShares,
    ) -> ValidationOutcome {
        if message.instance_id != self.config().instance_id {
            return ValidationOutcome::Reject("wrong instance id".into());
        }
        if !fits_i63(message.eon) {
            return ValidationOutcome::Reject("eon out of range".into());
        }
        if message.shares.is_empty() {
            return ValidationOutcome::Reject("no shares".into());
        }
        let Some(extra) = &message.extra else {
            return ValidationOutcome::Reject("missing slot metadata".into());
        };

        let trigger = match self.store().current_trigger(message.eon).await {
            Ok(Some(trigger)) => trigger,
            Ok(None) => return ValidationOutcome::Ignore("no recorded trigger for eon".into()),
            Err(e) => return ValidationOutcome::Ignore(format!("store unavailable: {e}")),
        };
        if message.identities_hash() != trigger.identities_hash {
            return ValidationOutcome::Ignore("unexpected identities hash".into());
        }
        if extra.slot != trigger.slot {
            return ValidationOutcome::Ignore("unexpected slot".into());
        }
        if extra.tx_pointer != trigger.tx_pointer {
            return ValidationOutcome::Ignore("unexpected tx pointer".into());
        }

        let keyper_set = match self.store().keyper_set_by_index(message.eon).await {
            Ok(Some(set)) => set,
            Ok(None) => return ValidationOutcome::Reject("unknown keyper set".into()),
            Err(e) => return ValidationOutcome::Ignore(format!("store unavailable: {e}")),
        };
        let Some(signer) = keyper_set.members.get(message.keyper_index as usize) else {
            return ValidationOutcome::Reject("keyper index out of range".into());
        };

        let data = SlotDecryptionSignatureData {
            instance_id: message.instance_id,
            eon: message.eon,
            slot: extra.slot,
            tx_pointer: extra.tx_pointer,
            identity_preimages: message.identity_preimages(),
        };
        match data.verify(&extra.signature, signer) {
            Ok(true) => ValidationOutcome::Accept,
            Ok(false) => ValidationOutcome::Reject("invalid signature".into()),
            Err(e) => ValidationOutcome::Reject(format!("malformed signature: {e}")),
        }
    }

    /// Validate an inbound keys message: instance, bounds, and
    /// threshold-many signatures by distinct members of the eon's keyper
    /// set over the message's attestation content.
    pub async fn validate_keys(&self, message: &DecryptionKeys) -> ValidationOutcome {
        if message.instance_id != self.config().instance_id {
            return ValidationOutcome::Reject("wrong instance id".into());
        }
        if !fits_i63(message.eon) {
            return ValidationOutcome::Reject("eon out of range".into());
        }
        if message.keys.is_empty() {
            return ValidationOutcome::Reject("no keys".into());
        }
        if message.keys.len() as u64 > self.config().max_num_keys_per_message {
            return ValidationOutcome::Reject("too many keys".into());
        }
        let Some(extra) = &message.extra else {
            return ValidationOutcome::Reject("missing slot metadata".into());
        };

        let keyper_set = match self.store().keyper_set_by_index(message.eon).await {
            Ok(Some(set)) => set,
            Ok(None) => return ValidationOutcome::Reject("unknown keyper set".into()),
            Err(e) => return ValidationOutcome::Ignore(format!("store unavailable: {e}")),
        };

        if extra.signer_indices.len() != extra.signatures.len() {
            return ValidationOutcome::Reject("signer and signature counts differ".into());
        }
        if extra.signatures.len() < keyper_set.threshold as usize {
            return ValidationOutcome::Reject("not enough signatures".into());
        }

        let data = SlotDecryptionSignatureData {
            instance_id: message.instance_id,
            eon: message.eon,
            slot: extra.slot,
            tx_pointer: extra.tx_pointer,
            identity_preimages: message.identity_preimages(),
        };
        if !extra.signer_indices.windows(2).all(|pair| pair[0] < pair[1]) {
            return ValidationOutcome::Reject("signer indices not strictly increasing".into());
        }
        let Some(signers) = keyper_set.subset(&extra.signer_indices) else {
            return ValidationOutcome::Reject("signer index out of range".into());
        };
        for (signer, signature) in signers.iter().zip(&extra.signatures) {
            match data.verify(signature, signer) {
                Ok(true) => {}
                Ok(false) => return ValidationOutcome::Reject("invalid signature".into()),
                Err(e) => {
                    return ValidationOutcome::Reject(format!("malformed signature: {e}"))
                }
            }
        }
        ValidationOutcome::Accept
    }
}
