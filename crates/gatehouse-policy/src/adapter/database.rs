//! Relational policy store backed by the `policy_rules` table.

use async_trait::async_trait;
use tracing::info;

use gatehouse_core::config::DatabaseConfig;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;
use gatehouse_database::migration::run_migrations;
use gatehouse_database::{DatabasePool, PolicyRuleRepository};

/// Policy store reading and writing rows of `policy_rules`.
#[derive(Debug, Clone)]
pub struct DatabasePolicyStore {
    repo: PolicyRuleRepository,
}

impl DatabasePolicyStore {
    /// Wrap an existing repository.
    pub fn new(repo: PolicyRuleRepository) -> Self {
        Self { repo }
    }

    /// Connect to PostgreSQL, apply migrations if configured, and build the store.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = DatabasePool::connect(config).await?;
        if config.run_migrations {
            run_migrations(pool.pool()).await?;
        }
        info!("Relational policy store ready");
        Ok(Self::new(PolicyRuleRepository::new(pool.into_pool())))
    }
}

#[async_trait]
impl PolicyStore for DatabasePolicyStore {
    async fn load_policies(&self) -> AppResult<Vec<PolicyRule>> {
        self.repo.find_all().await
    }

    async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
        self.repo.replace_all(rules).await
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.repo.insert(rule).await
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.repo.delete(rule).await
    }

    fn backend(&self) -> &'static str {
        "database"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.repo.health_check().await
    }
}
