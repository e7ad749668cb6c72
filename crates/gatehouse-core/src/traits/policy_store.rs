//! Policy store trait for pluggable durable rule storage.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::PolicyRule;

/// Trait for durable policy-rule storage (flat file, relational table, ...).
///
/// Every implementation must expose identical read semantics: `load_policies`
/// returns the complete current rule set, in storage order, with no
/// duplicates. Reads may block on I/O and may run concurrently.
#[async_trait]
pub trait PolicyStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load every rule currently persisted.
    async fn load_policies(&self) -> AppResult<Vec<PolicyRule>>;

    /// Replace the persisted rule set with `rules`.
    async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()>;

    /// Persist one rule. Returns `false` if it was already present.
    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool>;

    /// Delete one rule. Returns `false` if it was not present.
    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool>;

    /// Short backend label for logs and health output.
    fn backend(&self) -> &'static str;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
