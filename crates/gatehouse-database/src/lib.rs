//! # gatehouse-database
//!
//! PostgreSQL connection management, migrations, and the repository backing
//! the relational policy store.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::policy_rule::PolicyRuleRepository;
