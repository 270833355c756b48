//! `buildah-vendor-treadmill --sync`: refresh the treadmill branch.

use anyhow::Result;
use colored::Colorize;
use treadmill_core::Settings;
use treadmill_sync::Action;

use super::{dry_run_prefix, execute};

pub fn run(settings: &Settings) -> Result<()> {
    let outcome = execute(Action::Sync, settings)?;
    println!(
        "{}{} {}",
        dry_run_prefix(settings),
        "✓".green().bold(),
        outcome.message
    );

    if !outcome.changed {
        println!("  nothing to push");
        return Ok(());
    }

    println!();
    println!("Update the treadmill PR with:");
    println!("  {}", "git push --force".bold());
    Ok(())
}
