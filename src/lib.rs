//! # sem-core: Semantic Diff Core
//!
//! Reports changes at the level of named program entities — functions,
//! classes, config properties, Markdown headings, CSV rows — instead of
//! text lines.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      orchestrator                        │
//! ├───────────────┬───────────────┬──────────────┬───────────┤
//! │     lang      │   matching    │   storage    │    vcs    │
//! │ (plugins per  │ (identity ->  │ (SQLite:     │ (git2-    │
//! │  language /   │  hash ->      │  entities,   │  backed   │
//! │  data format)  │  fuzzy)       │  changes)    │  bridge)  │
//! └───────────────┴───────────────┴──────────────┴───────────┘
//!                  all built on `core`'s Entity / SemanticChange model
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use sem_core::{lang::ParserRegistry, orchestrator::compute_semantic_diff, DiffScope, FileChange, FileStatus, SemConfig};
//!
//! let registry = ParserRegistry::with_builtins();
//! let files = vec![FileChange {
//!     file_path: "src/lib.rs".to_string(),
//!     status: FileStatus::Modified,
//!     old_file_path: None,
//!     before_content: Some("fn greet() {}".to_string()),
//!     after_content: Some("fn greet() { println!(\"hi\"); }".to_string()),
//! }];
//! let cancel = AtomicBool::new(false);
//! let config = SemConfig::default();
//! let result = compute_semantic_diff(&files, &registry, DiffScope::Working, None, None, &cancel, &config).unwrap();
//! println!("{} changes", result.summary.total);
//! ```

pub mod core;
pub mod lang;
pub mod matching;
pub mod orchestrator;
pub mod storage;
pub mod vcs;

pub use core::{
    content_hash, short_hash, ChangeType, DiffResult, DiffScope, DiffSummary, Entity, EntityType,
    FileChange, FileStatus, Result, ResultExt, SemConfig, SemError, SemanticChange,
};
pub use lang::{EntityPlugin, ParserRegistry, PluginInfo};
pub use matching::{jaccard_token_similarity, match_entities, SimilarityFn};
pub use orchestrator::compute_semantic_diff;
pub use storage::{blame_file, entity_history, ChangeFilter, EntityFilter, SqliteStore, Store};
pub use vcs::{GitBridge, VcsBridge};

/// Library version, forwarded from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
