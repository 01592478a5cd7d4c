//! Contract-event handlers registered with the chain follower.

pub mod eon_key;
pub mod keyper_set;
pub mod validator_registry;

pub use eon_key::EonKeyBroadcastHandler;
pub use keyper_set::{KeyperSetAddedHandler, KeyperSetEonStore};
pub use validator_registry::{
    RegistrationMessage, ValidatorRegistryUpdatedHandler, REGISTRATION_MESSAGE_LEN,
    REGISTRATION_MESSAGE_VERSION,
};
