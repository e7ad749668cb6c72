//! Policy store manager that dispatches to the configured variant.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gatehouse_core::config::{DatabaseConfig, PolicyConfig, PolicyStoreKind};
use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;

use crate::adapter::{DatabasePolicyStore, FilePolicyStore};

/// Policy store manager that wraps the configured store variant.
///
/// The variant is selected at construction time and never changes.
#[derive(Debug, Clone)]
pub struct PolicyStoreManager {
    /// The inner policy store.
    inner: Arc<dyn PolicyStore>,
}

impl PolicyStoreManager {
    /// Create a policy store from configuration.
    ///
    /// The store must be reachable; anything else is an initialization
    /// failure and the process should not start serving.
    pub async fn new(config: &PolicyConfig, database: Option<&DatabaseConfig>) -> AppResult<Self> {
        let inner: Arc<dyn PolicyStore> = match config.store {
            PolicyStoreKind::File => {
                info!(path = %config.file_path, "Initializing flat-file policy store");
                Arc::new(FilePolicyStore::new(&config.file_path))
            }
            PolicyStoreKind::Database => {
                let database = database.ok_or_else(|| {
                    AppError::initialization(
                        "policy.store = \"database\" requires a [database] section",
                    )
                })?;
                info!("Initializing relational policy store");
                Arc::new(DatabasePolicyStore::connect(database).await?)
            }
        };

        let healthy = inner
            .health_check()
            .await
            .map_err(|e| e.into_kind(ErrorKind::Initialization))?;
        if !healthy {
            return Err(AppError::initialization(format!(
                "Policy store '{}' is not reachable",
                inner.backend()
            )));
        }

        Ok(Self { inner })
    }

    /// Get a reference to the inner store.
    pub fn store(&self) -> &dyn PolicyStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl PolicyStore for PolicyStoreManager {
    async fn load_policies(&self) -> AppResult<Vec<PolicyRule>> {
        self.inner.load_policies().await
    }

    async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
        self.inner.save_policy(rules).await
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.inner.add_policy(rule).await
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.inner.remove_policy(rule).await
    }

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PolicyConfig {
            file_path: dir.path().join("missing.csv").display().to_string(),
            ..PolicyConfig::default()
        };
        let err = PolicyStoreManager::new(&config, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Initialization);
    }

    #[tokio::test]
    async fn file_store_is_selected_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");
        std::fs::write(&path, "p, alice, resource, read\n").unwrap();
        let config = PolicyConfig {
            file_path: path.display().to_string(),
            ..PolicyConfig::default()
        };

        let manager = PolicyStoreManager::new(&config, None).await.unwrap();
        assert_eq!(manager.backend(), "file");
        assert_eq!(manager.load_policies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn database_store_without_section_fails() {
        let config = PolicyConfig {
            store: PolicyStoreKind::Database,
            ..PolicyConfig::default()
        };
        let err = PolicyStoreManager::new(&config, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Initialization);
    }
}
