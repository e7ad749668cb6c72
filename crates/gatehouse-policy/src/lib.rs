//! # gatehouse-policy
//!
//! Policy enforcement for Gatehouse.
//!
//! ## Modules
//!
//! - `model`: declarative model definitions (request, policy, roles, effect, matcher)
//! - `matcher`: matcher expression parser and evaluator
//! - `role`: transitive role links built from `g` rules
//! - `enforcer`: per-request decisions over a fresh or cached rule snapshot
//! - `adapter`: flat-file, relational, and in-memory policy stores
//! - `provider`: startup-time store selection

pub mod adapter;
pub mod enforcer;
pub mod error;
pub mod matcher;
pub mod model;
pub mod provider;
pub mod role;

pub use adapter::{DatabasePolicyStore, FilePolicyStore, MemoryPolicyStore};
pub use enforcer::{PolicyEnforcer, PolicySnapshot};
pub use error::PolicyError;
pub use model::{Effect, Model};
pub use provider::PolicyStoreManager;
pub use role::RoleGraph;
