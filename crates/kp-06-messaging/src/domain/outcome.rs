//! # Validation Outcome

/// Trivalent pubsub validation result, returned per inbound message.
///
/// `Ignore` keeps the message off the local handoff path without punishing
/// the sender; `Reject` additionally signals a protocol violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The message is valid and is handed to the keyper core.
    Accept,
    /// The message is dropped without penalty.
    Ignore(String),
    /// The message violates the protocol.
    Reject(String),
}

impl ValidationOutcome {
    /// Whether the message passed validation.
    pub fn is_accept(&self) -> bool {
        matches!(self, ValidationOutcome::Accept)
    }
}
