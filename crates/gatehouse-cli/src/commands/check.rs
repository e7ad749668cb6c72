//! Offline policy decision.

use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use gatehouse_core::error::AppError;

/// Arguments for `check`
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Subject
    pub subject: String,
    /// Object
    pub object: String,
    /// Action
    pub action: String,
}

#[derive(Debug, Serialize)]
struct Decision<'a> {
    subject: &'a str,
    object: &'a str,
    action: &'a str,
    allowed: bool,
}

/// Execute `check`
pub async fn execute(
    args: &CheckArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let enforcer = super::open_enforcer(&config).await?;

    let allowed = enforcer
        .enforce(&args.subject, &args.object, &args.action)
        .await?;

    match format {
        OutputFormat::Json => output::print_item(
            &Decision {
                subject: &args.subject,
                object: &args.object,
                action: &args.action,
                allowed,
            },
            format,
        ),
        OutputFormat::Table => {
            let verdict = if allowed { "allow" } else { "deny" };
            println!(
                "{} {} {} -> {verdict}",
                args.subject, args.object, args.action
            );
        }
    }

    Ok(())
}
