//! buildah-vendor-treadmill: keep podman building against buildah mainline.
//!
//! # Usage
//!
//! ```text
//! buildah-vendor-treadmill --sync [-n] [-v|--debug] [-f]
//! buildah-vendor-treadmill --pick [-n] [-v|--debug] [-f]
//! ```
//!
//! `--sync` refreshes the treadmill branch: rebase on podman main, re-vendor
//! buildah main, build and test. `--pick` lands the treadmill PR's podman
//! changes on top of a real buildah vendor commit.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use colored::Colorize;
use treadmill_core::{config::TOOL_NAME, Settings};
use treadmill_sync::Action;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "buildah-vendor-treadmill",
    version,
    about = "Vendor buildah mainline into podman and carry the podman fixes it needs",
    long_about = None,
    group(ArgGroup::new("action").required(true).args(["sync", "pick"])),
)]
struct Cli {
    /// Rebase the treadmill branch on main and re-vendor buildah main.
    #[arg(long)]
    sync: bool,

    /// Cherry-pick the treadmill PR's changes onto a buildah vendor commit.
    #[arg(long)]
    pick: bool,

    /// Log every command that is run.
    #[arg(short, long)]
    verbose: bool,

    /// Log everything, including command output handling.
    #[arg(long)]
    debug: bool,

    /// Accepted for compatibility; no check is skipped.
    #[arg(short, long)]
    force: bool,

    /// Show what would be changed without touching the branch.
    #[arg(short = 'n', long)]
    dry_run: bool,

    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    token: Option<String>,
}

impl Cli {
    fn action(&self) -> Action {
        if self.pick {
            Action::Pick
        } else {
            Action::Sync
        }
    }

    fn settings(&self) -> Settings {
        Settings::default()
            .with_dry_run(self.dry_run)
            .with_verbose(self.verbose)
            .with_debug(self.debug)
            .with_force(self.force)
            .with_token(self.token.clone())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version are printed to stdout and are not failures.
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return code;
        }
    };
    let settings = cli.settings();
    init_tracing(settings.log_level());

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", format!("{TOOL_NAME}:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    tracing::debug!(
        dry_run = settings.dry_run,
        force = settings.force,
        token = settings.token.is_some(),
        "{TOOL_NAME} v{}",
        settings.tool_version
    );
    match cli.action() {
        Action::Sync => commands::sync::run(settings),
        Action::Pick => commands::pick::run(settings),
    }
}

fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
