//! In-memory policy store.

use std::sync::Mutex;

use async_trait::async_trait;

use gatehouse_core::result::AppResult;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;

/// Policy store holding rules in process memory.
///
/// Nothing is persisted; used for tests and for evaluating ad-hoc rule sets.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    rules: Mutex<Vec<PolicyRule>>,
}

impl MemoryPolicyStore {
    /// Create a store seeded with `rules` (duplicates are dropped).
    pub fn new(rules: impl IntoIterator<Item = PolicyRule>) -> Self {
        let mut unique = Vec::new();
        for rule in rules {
            if !unique.contains(&rule) {
                unique.push(rule);
            }
        }
        Self {
            rules: Mutex::new(unique),
        }
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load_policies(&self) -> AppResult<Vec<PolicyRule>> {
        Ok(self.rules.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
        let mut unique: Vec<PolicyRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if !unique.contains(rule) {
                unique.push(rule.clone());
            }
        }
        *self.rules.lock().unwrap_or_else(|e| e.into_inner()) = unique;
        Ok(())
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        if rules.contains(rule) {
            return Ok(false);
        }
        rules.push(rule.clone());
        Ok(true)
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        let before = rules.len();
        rules.retain(|r| r != rule);
        Ok(rules.len() != before)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
