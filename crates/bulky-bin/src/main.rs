mod cli;
mod preview;

use anyhow::Result;
use bulky_core::{
    EngineState, Identity, LocalStorage, MemoryPreferences, RenameEngine, TransformConfig,
};
use cli::{Cli, TargetArgs};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    info!("Starting bulky");

    let (config, target) = cli.command.into_parts();
    handle_rename_command(config, target)?;

    info!("Bulky completed successfully");
    Ok(())
}

fn handle_rename_command(config: TransformConfig, target: TargetArgs) -> Result<()> {
    let mut engine = RenameEngine::new(LocalStorage::new(), MemoryPreferences::new());

    info!("Operation: {}", config.kind());
    info!("Interactive mode: {}", target.interactive);

    if target.dry_run {
        warn!("Dry run mode - no changes will be made");
    }

    let current_dir = std::env::current_dir()?;
    let identities: Vec<Identity> = target
        .paths
        .iter()
        .map(|path| Identity::from(absolutize(&current_dir, path).as_path()))
        .collect();

    let report = engine.set_entries(identities);
    for (identity, error) in &report.rejected {
        println!("Skipping {}: {}", identity, error);
    }
    if engine.entries().is_empty() {
        anyhow::bail!("None of the given paths could be loaded");
    }

    if target.sort {
        engine.sort_entries_by_name();
    }
    if let Some(scope) = target.scope {
        engine.set_scope(scope.into());
    }
    info!("Scope: {}", engine.scope());
    engine.set_transform_config(config);

    preview::print_preview(engine.preview())?;

    let changes = engine.preview().iter().filter(|p| p.is_change()).count();
    let flagged = engine.preview().iter().filter(|p| !p.status.is_ok()).count();

    match engine.state() {
        EngineState::Clean => {}
        EngineState::Blocked if flagged > 0 => {
            anyhow::bail!("{} of {} entries have problems; nothing was renamed", flagged, engine.entries().len());
        }
        state => {
            println!("Nothing to rename.");
            info!("Preview state: {}", state);
            return Ok(());
        }
    }

    if target.dry_run {
        println!("Dry run: {} renames previewed.", changes);
        return Ok(());
    }

    if target.interactive && !preview::confirm_commit(changes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let result = engine.commit()?;
    preview::print_commit_result(&result, changes);

    if !result.is_complete() {
        anyhow::bail!("Rename stopped after {} of {} entries", result.succeeded.len(), changes);
    }

    Ok(())
}

/// Joins relative paths onto `current_dir` and drops `.` components and
/// trailing separators so identities compare by path.
fn absolutize(current_dir: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir.join(path)
    };
    joined.components().collect()
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact()
        )
        .with(filter)
        .init();

    Ok(())
}
