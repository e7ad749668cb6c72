//! Permission rule CLI commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat, RuleRow};
use gatehouse_core::error::AppError;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;
use gatehouse_policy::FilePolicyStore;

/// Arguments for policy commands
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy subcommand
    #[command(subcommand)]
    pub command: PolicyCommand,
}

/// Policy subcommands
#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// List permission rules
    List {
        /// Include role links
        #[arg(long)]
        all: bool,
    },
    /// Grant `action` on `object` to `subject`
    Add {
        /// Subject or role
        subject: String,
        /// Object
        object: String,
        /// Action
        action: String,
    },
    /// Revoke a permission rule
    Remove {
        /// Subject or role
        subject: String,
        /// Object
        object: String,
        /// Action
        action: String,
    },
    /// Replace the whole rule set with the rules of a policy file
    Import {
        /// Flat policy file to read
        file: PathBuf,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Execute policy commands
pub async fn execute(
    args: &PolicyArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let enforcer = super::open_enforcer(&config).await?;

    match &args.command {
        PolicyCommand::List { all } => {
            let rules = enforcer.policies().await?;
            let rows: Vec<RuleRow> = rules
                .iter()
                .filter(|r| *all || r.is_permission())
                .map(RuleRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        PolicyCommand::Add {
            subject,
            object,
            action,
        } => {
            let rule = PolicyRule::permission(subject, object, action);
            if enforcer.add_policy(&rule).await? {
                output::print_success(&format!("Added '{rule}'"));
            } else {
                output::print_warning(&format!("'{rule}' already exists"));
            }
        }
        PolicyCommand::Remove {
            subject,
            object,
            action,
        } => {
            let rule = PolicyRule::permission(subject, object, action);
            if enforcer.remove_policy(&rule).await? {
                output::print_success(&format!("Removed '{rule}'"));
            } else {
                output::print_warning(&format!("'{rule}' not found"));
            }
        }
        PolicyCommand::Import { file, force } => {
            let rules = FilePolicyStore::new(file).load_policies().await?;

            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Replace every rule in the {} store with {} rules from '{}'?",
                        enforcer.store().backend(),
                        rules.len(),
                        file.display()
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            enforcer.save_policy(&rules).await?;
            output::print_success(&format!("Imported {} rules", rules.len()));
        }
    }

    Ok(())
}
