//! # gatehouse-core
//!
//! Core crate for Gatehouse. Contains the capability traits shared by the
//! session and policy subsystems, configuration schemas, shared domain types,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Gatehouse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use types::{PolicyRule, Subject};
