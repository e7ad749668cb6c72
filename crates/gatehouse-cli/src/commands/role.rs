//! Role link CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat, RuleRow};
use gatehouse_core::error::AppError;
use gatehouse_core::types::PolicyRule;

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// List role links
    List,
    /// Make `member` inherit `role`
    Add {
        /// Subject or role that gains the role
        member: String,
        /// Role granted
        role: String,
    },
    /// Remove a role link
    Remove {
        /// Member of the link
        member: String,
        /// Role of the link
        role: String,
    },
}

/// Execute role commands
pub async fn execute(
    args: &RoleArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let enforcer = super::open_enforcer(&config).await?;

    match &args.command {
        RoleCommand::List => {
            let rules = enforcer.policies().await?;
            let rows: Vec<RuleRow> = rules
                .iter()
                .filter(|r| r.is_grouping())
                .map(RuleRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        RoleCommand::Add { member, role } => {
            let rule = PolicyRule::grouping(member, role);
            if enforcer.add_policy(&rule).await? {
                output::print_success(&format!("{member} now holds {role}"));
            } else {
                output::print_warning(&format!("{member} already holds {role}"));
            }
        }
        RoleCommand::Remove { member, role } => {
            let rule = PolicyRule::grouping(member, role);
            if enforcer.remove_policy(&rule).await? {
                output::print_success(&format!("{member} no longer holds {role}"));
            } else {
                output::print_warning(&format!("{member} does not hold {role}"));
            }
        }
    }

    Ok(())
}
