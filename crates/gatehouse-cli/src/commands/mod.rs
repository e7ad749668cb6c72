//! CLI command definitions and dispatch.

pub mod check;
pub mod model;
pub mod policy;
pub mod role;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use gatehouse_core::config::AppConfig;
use gatehouse_core::error::AppError;
use gatehouse_policy::{PolicyEnforcer, PolicyStoreManager};

/// Gatehouse policy administration
#[derive(Debug, Parser)]
#[command(name = "gatehouse-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Permission rule management
    Policy(policy::PolicyArgs),
    /// Role link management
    Role(role::RoleArgs),
    /// Evaluate a single decision against the configured store
    Check(check::CheckArgs),
    /// Model file tools
    Model(model::ModelArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Policy(args) => policy::execute(args, &self.config, self.format).await,
            Commands::Role(args) => role::execute(args, &self.config, self.format).await,
            Commands::Check(args) => check::execute(args, &self.config, self.format).await,
            Commands::Model(args) => model::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: open the configured store and compile the model.
///
/// Writes always go through the enforcer so rules are checked against the
/// model before they reach the store.
pub async fn open_enforcer(config: &AppConfig) -> Result<PolicyEnforcer, AppError> {
    let store = PolicyStoreManager::new(&config.policy, config.database.as_ref()).await?;
    PolicyEnforcer::from_config(&config.policy, Arc::new(store))
}
