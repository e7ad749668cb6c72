//! Policy model and storage configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which durable policy store backs the enforcer.
///
/// Chosen once at startup and immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStoreKind {
    /// Comma-separated rule lines in a flat file.
    #[default]
    File,
    /// Rows in the `policy_rules` table.
    Database,
}

impl std::fmt::Display for PolicyStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyStoreKind::File => write!(f, "file"),
            PolicyStoreKind::Database => write!(f, "database"),
        }
    }
}

/// When the enforcer refreshes its rule snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadMode {
    /// Reload the full rule set before every decision.
    #[default]
    PerRequest,
    /// Keep a snapshot until a write goes through the enforcer.
    OnWrite,
}

/// Policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Store variant.
    #[serde(default)]
    pub store: PolicyStoreKind,
    /// Path to the declarative model definition.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Path to the rule file (file store only).
    #[serde(default = "default_file_path")]
    pub file_path: String,
    /// Upper bound on a single rule load, in milliseconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_ms: u64,
    /// Snapshot refresh strategy.
    #[serde(default)]
    pub reload: ReloadMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            store: PolicyStoreKind::default(),
            model_path: default_model_path(),
            file_path: default_file_path(),
            load_timeout_ms: default_load_timeout(),
            reload: ReloadMode::default(),
        }
    }
}

impl PolicyConfig {
    /// The load timeout as a `Duration`.
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn default_model_path() -> String {
    "config/rbac_model.conf".to_string()
}

fn default_file_path() -> String {
    "config/basic_policy.csv".to_string()
}

fn default_load_timeout() -> u64 {
    2000
}
