use super::print::print_messages;
use super::setup::Cli;
use clap::Parser;
use keepbak::api::{BackupApi, CmdResult};
use keepbak::clock::SystemClock;
use keepbak::config::{DEFAULT_LOG_LEVEL, LOG_ENV_VAR};
use keepbak::error::{KeepbakError, Result};
use keepbak::store::fs::FsStore;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let api = BackupApi::new(FsStore::new(), SystemClock);
    tracing::debug!(
        src = %cli.src.display(),
        dest = %cli.dest.display(),
        copies = cli.copies,
        "starting backup"
    );
    match api.backup(&cli.src, &cli.dest, cli.copies) {
        Ok(result) => {
            report(&cli, &result);
            Ok(())
        }
        Err(KeepbakError::Cleanup(failures)) => {
            // The backup itself was written; show it before the failure line.
            report(&cli, &failures.outcome);
            Err(KeepbakError::Cleanup(failures))
        }
        Err(e) => Err(e),
    }
}

fn report(cli: &Cli, result: &CmdResult) {
    log_result(result);
    if !cli.quiet {
        print_messages(&result.messages);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn log_result(result: &CmdResult) {
    for artifact in &result.kept {
        tracing::debug!(
            path = %artifact.path.display(),
            date = %artifact.backup_date,
            "kept"
        );
    }
    for artifact in &result.pruned {
        tracing::debug!(
            path = %artifact.path.display(),
            date = %artifact.backup_date,
            "pruned"
        );
    }
}
