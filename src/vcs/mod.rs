//! VCS bridge: the interface the core consumes to discover scope and read
//! blob content, plus one concrete implementation on top of `git2`.

pub mod git;

use crate::core::change::{DiffScope, FileChange};
use crate::core::errors::Result;

/// What a diff run consumes from version control. The core depends only on
/// this trait; `GitBridge` is one implementor, not a hard dependency.
pub trait VcsBridge {
    /// Whether `repoRoot` names a recognised repository.
    fn is_repo(&self) -> bool;

    /// Absolute path to the repository root.
    fn repo_root(&self) -> Result<String>;

    /// Name of the currently checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// Full SHA of `HEAD`.
    fn head_sha(&self) -> Result<String>;

    /// Infer the scope a bare `diff` invocation should use: staged changes
    /// if the index differs from `HEAD`, otherwise the working tree.
    fn detect_scope(&self) -> Result<DiffScope>;

    /// Enumerate files changed under `scope`, with `before_content` /
    /// `after_content` populated per scope semantics. Paths under `.sem/`
    /// are filtered out.
    fn get_changed_files(&self, scope: &DiffScope) -> Result<Vec<FileChange>>;
}

pub use git::GitBridge;

/// A single file's content (if it existed) at one commit, newest-first
/// ordering when returned from a history walk. Used by blame/history, which
/// need commit-by-commit content that the narrow [`VcsBridge`] interface
/// does not expose.
#[derive(Debug, Clone)]
pub struct CommitSnapshot {
    pub sha: String,
    pub author: Option<String>,
    pub timestamp: Option<i64>,
    pub content: Option<String>,
}
