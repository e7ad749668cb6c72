//! Model file CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use gatehouse_core::error::AppError;
use gatehouse_policy::Model;

/// Arguments for model commands
#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Model subcommand
    #[command(subcommand)]
    pub command: ModelCommand,
}

/// Model subcommands
#[derive(Debug, Subcommand)]
pub enum ModelCommand {
    /// Compile a model file and report its definitions
    Validate {
        /// Model file (defaults to `policy.model_path`)
        path: Option<String>,
        /// Also check every stored rule against the model
        #[arg(long)]
        with_policy: bool,
    },
}

/// Execute model commands
pub async fn execute(
    args: &ModelArgs,
    config_path: &str,
    _format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;

    match &args.command {
        ModelCommand::Validate { path, with_policy } => {
            let path = path.as_deref().unwrap_or(&config.policy.model_path);
            let model = Model::from_file(path).map_err(AppError::from)?;

            output::print_success(&format!("{path} is a valid model"));
            output::print_kv("request", &model.request_fields().join(", "));
            output::print_kv("policy", &model.policy_fields().join(", "));
            output::print_kv("roles", &model.role_keys().join(", "));
            output::print_kv("effect", &model.effect().to_string());
            output::print_kv("matcher", model.matcher_source());

            if *with_policy {
                let enforcer = super::open_enforcer(&config).await?;
                let rules = enforcer.policies().await?;
                let mut invalid = 0;
                for rule in &rules {
                    if let Err(e) = model.validate_rule(rule) {
                        invalid += 1;
                        output::print_warning(&format!("'{rule}': {e}"));
                    }
                }
                if invalid > 0 {
                    return Err(AppError::validation(format!(
                        "{invalid} of {} stored rules do not fit the model",
                        rules.len()
                    )));
                }
                output::print_success(&format!("All {} stored rules fit the model", rules.len()));
            }
        }
    }

    Ok(())
}
