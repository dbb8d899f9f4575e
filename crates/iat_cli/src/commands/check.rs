//! Check command - Validate every template without building it.

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use iat_templates::BundleBuilder;

use super::PathArgs;

/// Raised when at least one template has issues.
#[derive(Debug, Error)]
#[error("{0} template(s) failed validation")]
pub struct ValidationFailed(pub usize);

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let config = args.paths.to_config()?;
    info!("Checking templates in {:?}", config.templates_dir);

    let builder = BundleBuilder::new(config);
    let report = builder.check_all().context("Failed to check templates")?;

    println!("Checking {} template(s)...\n", report.len());

    let mut failed = 0;
    for (template, issues) in &report {
        if issues.is_empty() {
            println!("{} ... ok", template);
        } else {
            println!("{} ... FAILED", template);
            for issue in issues {
                println!("   - {}", issue);
            }
            failed += 1;
        }
    }

    println!();
    println!("Results: {} passed, {} failed", report.len() - failed, failed);

    if failed > 0 {
        return Err(ValidationFailed(failed).into());
    }

    Ok(())
}
