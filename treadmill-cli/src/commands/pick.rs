//! `buildah-vendor-treadmill --pick`: land the treadmill payload.

use anyhow::Result;
use colored::Colorize;
use treadmill_core::Settings;
use treadmill_sync::Action;

use super::{dry_run_prefix, execute};

pub fn run(settings: &Settings) -> Result<()> {
    let outcome = execute(Action::Pick, settings)?;

    println!(
        "{}{} {}",
        dry_run_prefix(settings),
        "✓".green().bold(),
        outcome.message
    );
    println!();
    println!("Review the new commit message and amend it if needed:");
    println!("  {}", "git commit --amend".bold());
    println!("then push your branch and open or update the vendor PR.");
    Ok(())
}
