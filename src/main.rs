// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crystal_auditor::config::AuditConfig;
use crystal_auditor::io::load_corpus;
use crystal_auditor::pipeline::{CheckpointStore, DirectoryStore, Orchestrator};
use crystal_auditor::present::{render_summary, BandReference};
use crystal_auditor::reference::ReferenceTables;
use crystal_auditor::utils::logger;

/// Rule-based plausibility audit for predicted crystal structures
#[derive(Parser, Debug)]
#[command(name = "crystal-auditor", version)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the per-user config location)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit every structure in a corpus, resuming from the checkpoint directory
    Run {
        /// JSON array or JSON Lines of structure records
        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,

        #[arg(long, value_name = "DIR")]
        checkpoint: PathBuf,

        /// Use the rayon worker pool
        #[arg(long)]
        parallel: bool,

        /// Recompute structures that already have a checkpoint
        #[arg(short, long)]
        force: bool,

        /// Print the sweep summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one checkpointed report
    Report {
        #[arg(long, value_name = "DIR")]
        checkpoint: PathBuf,

        #[arg(long)]
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Print or save settings
    Config {
        /// Print the built-in defaults
        #[arg(long)]
        print_default: bool,

        /// Write the active settings to the per-user config location
        #[arg(long, conflicts_with = "print_default")]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("could not install logger")?;

    match cli.command {
        Command::Run {
            corpus,
            checkpoint,
            parallel,
            force,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run(config, &corpus, &checkpoint, parallel, force, json)
        }
        Command::Report {
            checkpoint,
            id,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            report(&config, &checkpoint, &id, json)
        }
        Command::Config {
            print_default,
            save,
        } => {
            if print_default {
                println!("{}", serde_json::to_string_pretty(&AuditConfig::default())?);
            } else if save {
                let config = load_config(cli.config.as_deref())?;
                log::info!("{}", config.save());
            } else {
                let config = load_config(cli.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AuditConfig> {
    match path {
        Some(p) => Ok(AuditConfig::load_from(p)?),
        None => {
            let (config, status) = AuditConfig::load();
            log::info!("{}", status);
            Ok(config)
        }
    }
}

fn run(
    config: AuditConfig,
    corpus: &Path,
    checkpoint: &Path,
    parallel: bool,
    force: bool,
    json: bool,
) -> Result<()> {
    let tables = Arc::new(ReferenceTables::load(&config.reference)?);
    let records = load_corpus(corpus)?;
    let store = Arc::new(DirectoryStore::open(checkpoint)?);
    let orchestrator = Orchestrator::new(tables, config, store).with_force(force);

    let outcome = if parallel {
        orchestrator.sweep_parallel(&records)
    } else {
        orchestrator.sweep(records)
    };
    let summary = outcome.context("sweep aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in summary.lines() {
            println!("{}", line);
        }
        for (id, reason) in &summary.structure_errors {
            log::debug!("{}: {}", id, reason);
        }
    }
    Ok(())
}

fn report(config: &AuditConfig, checkpoint: &Path, id: &str, json: bool) -> Result<()> {
    let store = DirectoryStore::open(checkpoint)?;
    let Some(report) = store.load(id)? else {
        bail!("no checkpointed report for '{}' in {:?}", id, checkpoint);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summary(&report, &BandReference::from_config(config)));
    }
    Ok(())
}
