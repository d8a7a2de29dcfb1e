//! `sem` CLI — a thin wrapper over `sem_core`.
//!
//! Owns argument parsing, `tracing-subscriber` initialisation, and the
//! exit-code/stderr convention; contains no entity-extraction, matching, or
//! storage logic of its own.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};

use sem_core::core::config::SemConfig;
use sem_core::storage::{blame_file, entity_history, SqliteStore, Store};
use sem_core::vcs::{GitBridge, VcsBridge};
use sem_core::{compute_semantic_diff, DiffScope, ParserRegistry, Result, SemError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Semantic diff core: report changes at the level of named program
/// entities instead of text lines.
#[derive(Parser)]
#[command(name = "sem", version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root; defaults to the current directory.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the semantic diff for the detected scope.
    Diff {
        /// Diff a specific commit instead of the detected scope.
        #[arg(long)]
        commit: Option<String>,

        /// Diff a commit range `from..to` instead of the detected scope.
        #[arg(long, value_names = ["FROM", "TO"], num_args = 2)]
        range: Option<Vec<String>>,
    },

    /// Attribute each entity in a file's current version to the commit
    /// that last changed it.
    Blame {
        file: String,

        #[arg(long, default_value_t = 200)]
        depth: usize,
    },

    /// Track an entity backward through commit history.
    History {
        file: String,
        query: String,

        #[arg(long, default_value_t = 200)]
        depth: usize,
    },

    /// Run a read-only SQL query against `.sem/sem.db`.
    Query { sql: String },

    /// List every registered entity-extraction plugin.
    Languages,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Diff { commit, range } => run_diff(&cli.repo, commit, range),
        Commands::Blame { file, depth } => run_blame(&cli.repo, &file, depth),
        Commands::History { file, query, depth } => run_history(&cli.repo, &file, &query, depth),
        Commands::Query { sql } => run_query(&cli.repo, &sql),
        Commands::Languages => run_languages(),
    }
}

fn run_diff(repo_root: &std::path::Path, commit: Option<String>, range: Option<Vec<String>>) -> Result<()> {
    let bridge = GitBridge::discover(repo_root);
    if !bridge.is_repo() {
        return Err(SemError::vcs(format!("{} is not a git repository", repo_root.display())));
    }

    let scope = match (commit, range) {
        (Some(sha), _) => DiffScope::Commit { sha },
        (None, Some(bounds)) => DiffScope::Range {
            from: bounds[0].clone(),
            to: bounds[1].clone(),
        },
        (None, None) => bridge.detect_scope()?,
    };

    let files = bridge.get_changed_files(&scope)?;
    let registry = ParserRegistry::with_builtins();
    let config = SemConfig::load_or_default(repo_root)?;
    let author = None;
    let commit_sha = match &scope {
        DiffScope::Commit { sha } => Some(sha.as_str()),
        _ => None,
    };
    let cancel = AtomicBool::new(false);

    let result = compute_semantic_diff(&files, &registry, scope, commit_sha, author, &cancel, &config)?;
    let json = serde_json::to_string_pretty(&result)?;
    println!("{json}");
    Ok(())
}

fn run_blame(repo_root: &std::path::Path, file: &str, depth: usize) -> Result<()> {
    let bridge = GitBridge::discover(repo_root);
    if !bridge.is_repo() {
        return Err(SemError::vcs(format!("{} is not a git repository", repo_root.display())));
    }
    let registry = ParserRegistry::with_builtins();
    let entries = blame_file(&bridge, &registry, file, depth)?;
    let json = serde_json::to_string_pretty(&entries.into_iter().map(blame_entry_json).collect::<Vec<_>>())?;
    println!("{json}");
    Ok(())
}

fn run_history(repo_root: &std::path::Path, file: &str, query: &str, depth: usize) -> Result<()> {
    let bridge = GitBridge::discover(repo_root);
    if !bridge.is_repo() {
        return Err(SemError::vcs(format!("{} is not a git repository", repo_root.display())));
    }
    let registry = ParserRegistry::with_builtins();
    let transitions = entity_history(&bridge, &registry, file, query, depth)?;
    let json =
        serde_json::to_string_pretty(&transitions.into_iter().map(history_entry_json).collect::<Vec<_>>())?;
    println!("{json}");
    Ok(())
}

fn run_query(repo_root: &std::path::Path, sql: &str) -> Result<()> {
    let config = SemConfig::load_or_default(repo_root)?;
    let db_path = repo_root.join(".sem").join("sem.db");
    let store = SqliteStore::open(db_path, &config.store)?;
    let rows = store.query(sql)?;
    let json = serde_json::to_string_pretty(&rows)?;
    println!("{json}");
    Ok(())
}

fn run_languages() -> Result<()> {
    let registry = ParserRegistry::with_builtins();
    for plugin in registry.list_plugins() {
        println!("{:<12} {}", plugin.id, plugin.extensions.join(", "));
    }
    Ok(())
}

fn blame_entry_json(entry: sem_core::storage::BlameEntry) -> serde_json::Value {
    serde_json::json!({
        "entityId": entry.entity_id,
        "entityName": entry.entity_name,
        "commitSha": entry.commit_sha,
        "author": entry.author,
        "timestamp": entry.timestamp,
    })
}

fn history_entry_json(entry: sem_core::storage::HistoryTransition) -> serde_json::Value {
    serde_json::json!({
        "commitSha": entry.commit_sha,
        "changeType": entry.change_type,
        "author": entry.author,
        "timestamp": entry.timestamp,
    })
}
