//! # gatehouse-auth
//!
//! Authentication for Gatehouse.
//!
//! ## Modules
//!
//! - `session`: TTL-bounded session store with one live session per subject,
//!   plus the background reaper
//! - `credential`: credential verification against configured accounts
//! - `login`: the login/logout flow tying verification to the session store

pub mod credential;
pub mod login;
pub mod session;

pub use credential::StaticCredentialVerifier;
pub use login::{LoginFlow, LoginOutcome};
pub use session::{Session, SessionCleanup, SessionStore};
