//! Flat-file policy store.
//!
//! One rule per line, fields separated by commas:
//!
//! ```text
//! p, alice, resource, read
//! g, bob, admin
//! ```
//!
//! Blank lines and `#` comments are ignored on read. Writes rewrite the whole
//! file through a temporary sibling and a rename, so readers never observe a
//! partially written file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;

/// Policy store backed by a comma-separated text file.
#[derive(Debug)]
pub struct FilePolicyStore {
    /// Path of the policy file.
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FilePolicyStore {
    /// Create a store over `path`. The file is not touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the policy file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rules(&self) -> AppResult<Vec<PolicyRule>> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read policy file '{}': {e}", self.path.display()),
                e,
            )
        })?;

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let parsed = PolicyRule::parse_line(line).map_err(|e| {
                AppError::storage(format!(
                    "{}:{}: {}",
                    self.path.display(),
                    number + 1,
                    e.message
                ))
            })?;
            if let Some(rule) = parsed {
                if seen.insert(rule.clone()) {
                    rules.push(rule);
                }
            }
        }
        Ok(rules)
    }

    async fn write_rules(&self, rules: &[PolicyRule]) -> AppResult<()> {
        let mut contents = String::new();
        for rule in rules {
            contents.push_str(&rule.to_line());
            contents.push('\n');
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, contents).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write '{}': {e}", tmp_path.display()),
                e,
            )
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace policy file '{}': {e}", self.path.display()),
                e,
            )
        })?;

        debug!(path = %self.path.display(), count = rules.len(), "Wrote policy file");
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load_policies(&self) -> AppResult<Vec<PolicyRule>> {
        self.read_rules().await
    }

    async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut seen = HashSet::new();
        let unique: Vec<PolicyRule> = rules
            .iter()
            .filter(|r| seen.insert(*r))
            .cloned()
            .collect();
        self.write_rules(&unique).await?;
        info!(path = %self.path.display(), count = unique.len(), "Saved policy file");
        Ok(())
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut rules = self.read_rules().await?;
        if rules.contains(rule) {
            return Ok(false);
        }
        rules.push(rule.clone());
        self.write_rules(&rules).await?;
        Ok(true)
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut rules = self.read_rules().await?;
        let before = rules.len();
        rules.retain(|r| r != rule);
        if rules.len() == before {
            return Ok(false);
        }
        self.write_rules(&rules).await?;
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(contents: &str) -> (tempfile::TempDir, FilePolicyStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, FilePolicyStore::new(path))
    }

    #[tokio::test]
    async fn loads_rules_skipping_comments_and_duplicates() {
        let (_dir, store) = store_with(
            "# reference policy\np, alice, resource, read\n\np, alice, resource, read\ng, bob, admin\n",
        );
        let rules = store.load_policies().await.unwrap();
        assert_eq!(
            rules,
            vec![
                PolicyRule::permission("alice", "resource", "read"),
                PolicyRule::grouping("bob", "admin"),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_line_reports_position() {
        let (_dir, store) = store_with("p, alice, resource, read\nq, broken\n");
        let err = store.load_policies().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains(":2:"));
    }

    #[tokio::test]
    async fn missing_file_is_a_storage_error_and_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::new(dir.path().join("absent.csv"));
        assert_eq!(store.load_policies().await.unwrap_err().kind, ErrorKind::Storage);
        assert!(!store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn add_then_remove_rewrites_file() {
        let (_dir, store) = store_with("p, alice, resource, read\n");
        let write = PolicyRule::permission("alice", "resource", "write");

        assert!(store.add_policy(&write).await.unwrap());
        assert!(!store.add_policy(&write).await.unwrap());
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "p, alice, resource, read\np, alice, resource, write\n");

        assert!(store.remove_policy(&write).await.unwrap());
        assert!(!store.remove_policy(&write).await.unwrap());
        assert_eq!(store.load_policies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_contents() {
        let (_dir, store) = store_with("p, alice, resource, read\n");
        store
            .save_policy(&[PolicyRule::grouping("carol", "admin")])
            .await
            .unwrap();
        assert_eq!(
            store.load_policies().await.unwrap(),
            vec![PolicyRule::grouping("carol", "admin")]
        );
        assert!(store.health_check().await.unwrap());
    }
}
