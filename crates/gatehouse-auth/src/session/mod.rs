//! Session lifecycle: issue, resolve, invalidate, and reap.

pub mod cleanup;
pub mod store;

pub use cleanup::SessionCleanup;
pub use store::{IssuedSession, Session, SessionStore};
