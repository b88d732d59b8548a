//! CLI definition and handler

mod progress;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use std::path::{Path, PathBuf};

use gitwalk::config::{load_config, Backend, GitwalkConfig, MAX_WORKERS};
use gitwalk::git::GitReader;
use gitwalk::models::EntityKind;
use gitwalk::store::{FactStore, MemoryStore, RedbStore, Schema, StoreStats};
use gitwalk::walker::{check_root, WalkReport, Walker};

use progress::ProgressObserver;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > MAX_WORKERS {
        Err(format!("workers cannot exceed {}", MAX_WORKERS))
    } else {
        Ok(n)
    }
}

/// gitwalk - ingest git history into a fact store
#[derive(Parser, Debug)]
#[command(name = "gitwalk")]
#[command(
    version,
    about = "Walk a directory tree and ingest every git repository's branches, commits and authors",
    after_help = "\
Examples:
  gitwalk ~/src                          Ingest into ./gitwalk.db
  gitwalk ~/src --db /tmp/facts.db       Ingest into a specific database
  gitwalk ~/src --store memory           Dry run against the in-memory store
  gitwalk ~/src --workers 8 --keep-going Parallel, record failures and continue"
)]
pub struct Cli {
    /// Directory to walk
    pub root: PathBuf,

    /// Fact store backend (default: redb, or the config file value)
    #[arg(long, value_parser = ["redb", "memory"])]
    pub store: Option<String>,

    /// Database file for the redb backend (default: gitwalk.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Number of parallel extraction workers (1-64)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Record per-repository failures and continue
    #[arg(long)]
    pub keep_going: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: ./gitwalk.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line overrides into the loaded config
    fn apply(&self, config: &mut GitwalkConfig) -> Result<()> {
        if let Some(store) = &self.store {
            config.store.backend = store.parse::<Backend>().map_err(anyhow::Error::msg)?;
        }
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(workers) = self.workers {
            config.walk.workers = workers;
        }
        if self.keep_going {
            config.walk.keep_going = true;
        }
        Ok(())
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref());
    cli.apply(&mut config)?;

    // Before opening the store, so a bad root leaves no database behind
    check_root(&cli.root)
        .with_context(|| format!("Failed to walk {}", cli.root.display()))?;

    let store = open_store(&config)?;
    let reader = GitReader::new();
    let observer = ProgressObserver::new();

    let result = Walker::new(&reader, store.as_ref(), &observer)
        .with_options(config.walk_options())
        .walk(&cli.root);
    observer.finish();
    let report = result.with_context(|| format!("Failed to walk {}", cli.root.display()))?;

    let stats = store.stats().context("Failed to read store statistics")?;
    print_summary(&report, &stats);

    if !report.is_success() {
        bail!(
            "{} of {} repositories failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
    }
    Ok(())
}

fn open_store(config: &GitwalkConfig) -> Result<Box<dyn FactStore>> {
    let schema = Schema::gitwalk();
    Ok(match config.store.backend {
        Backend::Memory => Box::new(MemoryStore::new(schema)),
        Backend::Redb => Box::new(open_redb(&config.store.path, schema)?),
    })
}

fn open_redb(path: &Path, schema: Schema) -> Result<RedbStore> {
    RedbStore::open(path, schema)
        .with_context(|| format!("Failed to open fact store at {}", path.display()))
}

fn print_summary(report: &WalkReport, stats: &StoreStats) {
    println!(
        "{}Ingested {} repositories",
        style("✓ ").green(),
        style(report.succeeded.len()).cyan()
    );
    for kind in EntityKind::ALL {
        println!("  {:<12} {}", kind.as_str(), style(stats.count(kind)).cyan());
    }
    println!("  {:<12} {}", "Edges", style(stats.edges).cyan());

    for failure in &report.failed {
        eprintln!(
            "{}{}: {}",
            style("⚠ ").yellow(),
            failure.path.display(),
            failure.error
        );
    }
}
