//! Capability traits implemented by pluggable backends.

pub mod credential;
pub mod policy_store;

pub use credential::CredentialVerifier;
pub use policy_store::PolicyStore;
