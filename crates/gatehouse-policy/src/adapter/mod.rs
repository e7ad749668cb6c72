//! Policy store variants.

pub mod database;
pub mod file;
pub mod memory;

pub use database::DatabasePolicyStore;
pub use file::FilePolicyStore;
pub use memory::MemoryPolicyStore;
