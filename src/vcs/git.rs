//! `git2`-backed [`VcsBridge`] implementation.
//!
//! Grounded on the teacher's `doc_audit::git_utils::GitHelper`: repository
//! discovery via `Repository::discover`, tree-to-tree diffing for
//! changed-file detection, and `git2::Time` conversion through `chrono`.

use std::path::{Path, PathBuf};

use git2::{Delta, Diff, DiffOptions, Oid, Repository, Tree};

use super::CommitSnapshot;

use crate::core::change::{DiffScope, FileChange, FileStatus};
use crate::core::errors::{Result, SemError};

use super::VcsBridge;

/// Paths under this directory are never reported as changed files.
const SEM_DIR_PREFIX: &str = ".sem/";

pub struct GitBridge {
    repo: Option<Repository>,
    repo_root: PathBuf,
}

impl GitBridge {
    /// Discover a repository starting from `start`, walking upward. If no
    /// repository is found, `is_repo()` returns `false` and every other
    /// operation returns a [`SemError::Vcs`].
    pub fn discover(start: impl AsRef<Path>) -> Self {
        let start = start.as_ref();
        match Repository::discover(start) {
            Ok(repo) => {
                let repo_root = repo
                    .workdir()
                    .map(|path| path.to_path_buf())
                    .unwrap_or_else(|| start.to_path_buf());
                Self {
                    repo: Some(repo),
                    repo_root,
                }
            }
            Err(_) => Self {
                repo: None,
                repo_root: start.to_path_buf(),
            },
        }
    }

    fn require_repo(&self) -> Result<&Repository> {
        self.repo.as_ref().ok_or_else(|| SemError::vcs("not a git repository"))
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn is_sem_path(path: &str) -> bool {
        path.starts_with(SEM_DIR_PREFIX)
    }

    fn blob_text(repo: &Repository, oid: Oid) -> Option<String> {
        if oid.is_zero() {
            return None;
        }
        repo.find_blob(oid)
            .ok()
            .map(|blob| String::from_utf8_lossy(blob.content()).into_owned())
    }

    fn workdir_text(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.repo_root.join(relative)).ok()
    }

    fn status_of(delta: Delta) -> FileStatus {
        match delta {
            Delta::Added | Delta::Untracked | Delta::Copied => FileStatus::Added,
            Delta::Deleted => FileStatus::Deleted,
            Delta::Renamed => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }

    /// Build the `{FileChange}` list from a diff, reading before/after
    /// content via the supplied closures (so callers can source content
    /// from a tree, the index, or the live working directory).
    fn collect(
        &self,
        repo: &Repository,
        diff: &Diff<'_>,
        before_of: impl Fn(Oid, &str) -> Option<String>,
        after_of: impl Fn(Oid, &str) -> Option<String>,
    ) -> Result<Vec<FileChange>> {
        let _ = repo;
        let mut changes = Vec::new();

        for delta in diff.deltas() {
            let status = Self::status_of(delta.status());

            let old_path = delta.old_file().path().map(|p| self.relative_path(p));
            let new_path = delta.new_file().path().map(|p| self.relative_path(p));
            let file_path = new_path.clone().or_else(|| old_path.clone());
            let Some(file_path) = file_path else { continue };
            if Self::is_sem_path(&file_path) {
                continue;
            }

            let old_file_path = match status {
                FileStatus::Renamed => old_path.filter(|p| p != &file_path),
                _ => None,
            };

            let before_content = match status {
                FileStatus::Added => None,
                _ => before_of(delta.old_file().id(), old_path.as_deref().unwrap_or(&file_path)),
            };
            let after_content = match status {
                FileStatus::Deleted => None,
                _ => after_of(delta.new_file().id(), &file_path),
            };

            changes.push(FileChange {
                file_path,
                status,
                old_file_path,
                before_content,
                after_content,
            });
        }

        Ok(changes)
    }

    fn tree_for(repo: &Repository, oid: Oid) -> Result<Tree<'_>> {
        let commit = repo.find_commit(oid).map_err(SemError::from)?;
        commit.tree().map_err(SemError::from)
    }

    fn resolve_commit(repo: &Repository, spec: &str) -> Result<Oid> {
        repo.revparse_single(spec)
            .map_err(SemError::from)?
            .peel_to_commit()
            .map_err(SemError::from)
            .map(|c| c.id())
    }

    /// Walk `HEAD`'s ancestry newest-first, up to `max_depth` commits,
    /// recording `file_path`'s content (or absence) at each commit. Used by
    /// blame and history, which need per-commit content the narrow
    /// [`VcsBridge`] interface does not expose.
    pub fn commit_history_for_path(&self, file_path: &str, max_depth: usize) -> Result<Vec<CommitSnapshot>> {
        let repo = self.require_repo()?;
        let mut walker = repo.revwalk().map_err(SemError::from)?;
        walker.push_head().map_err(SemError::from)?;

        let mut snapshots = Vec::new();
        for oid in walker.take(max_depth) {
            let oid = oid.map_err(SemError::from)?;
            let commit = repo.find_commit(oid).map_err(SemError::from)?;
            let tree = commit.tree().map_err(SemError::from)?;

            let content = tree
                .get_path(Path::new(file_path))
                .ok()
                .and_then(|entry| Self::blob_text(repo, entry.id()));

            let author = commit.author().name().map(|s| s.to_string());
            let timestamp = Some(commit.time().seconds());

            snapshots.push(CommitSnapshot {
                sha: oid.to_string(),
                author,
                timestamp,
                content,
            });
        }

        Ok(snapshots)
    }
}

impl VcsBridge for GitBridge {
    fn is_repo(&self) -> bool {
        self.repo.is_some()
    }

    fn repo_root(&self) -> Result<String> {
        self.require_repo()?;
        Ok(self.repo_root.to_string_lossy().into_owned())
    }

    fn current_branch(&self) -> Result<String> {
        let repo = self.require_repo()?;
        let head = repo.head().map_err(SemError::from)?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn head_sha(&self) -> Result<String> {
        let repo = self.require_repo()?;
        let commit = repo.head().map_err(SemError::from)?.peel_to_commit().map_err(SemError::from)?;
        Ok(commit.id().to_string())
    }

    fn detect_scope(&self) -> Result<DiffScope> {
        let repo = self.require_repo()?;
        let head_tree = repo.head().map_err(SemError::from)?.peel_to_tree().map_err(SemError::from)?;

        let mut opts = DiffOptions::new();
        let staged = repo
            .diff_tree_to_index(Some(&head_tree), None, Some(&mut opts))
            .map_err(SemError::from)?;

        if staged.deltas().len() > 0 {
            Ok(DiffScope::Staged)
        } else {
            Ok(DiffScope::Working)
        }
    }

    fn get_changed_files(&self, scope: &DiffScope) -> Result<Vec<FileChange>> {
        let repo = self.require_repo()?;

        match scope {
            DiffScope::Working => {
                let head_tree = repo.head().map_err(SemError::from)?.peel_to_tree().map_err(SemError::from)?;
                let mut opts = DiffOptions::new();
                opts.include_untracked(true).recurse_untracked_dirs(true);
                let diff = repo
                    .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))
                    .map_err(SemError::from)?;

                self.collect(
                    repo,
                    &diff,
                    |oid, _path| Self::blob_text(repo, oid),
                    |_oid, path| self.workdir_text(path),
                )
            }
            DiffScope::Staged => {
                let head_tree = repo.head().map_err(SemError::from)?.peel_to_tree().map_err(SemError::from)?;
                let mut opts = DiffOptions::new();
                let diff = repo
                    .diff_tree_to_index(Some(&head_tree), None, Some(&mut opts))
                    .map_err(SemError::from)?;

                self.collect(
                    repo,
                    &diff,
                    |oid, _path| Self::blob_text(repo, oid),
                    |oid, _path| Self::blob_text(repo, oid),
                )
            }
            DiffScope::Commit { sha } => {
                let oid = Self::resolve_commit(repo, sha)?;
                let commit = repo.find_commit(oid).map_err(SemError::from)?;
                let new_tree = commit.tree().map_err(SemError::from)?;
                let old_tree = commit.parent(0).ok().map(|p| p.tree()).transpose().map_err(SemError::from)?;

                let mut opts = DiffOptions::new();
                let diff = repo
                    .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut opts))
                    .map_err(SemError::from)?;

                self.collect(
                    repo,
                    &diff,
                    |oid, _path| Self::blob_text(repo, oid),
                    |oid, _path| Self::blob_text(repo, oid),
                )
            }
            DiffScope::Range { from, to } => {
                let from_oid = Self::resolve_commit(repo, from)?;
                let to_oid = Self::resolve_commit(repo, to)?;
                let from_tree = Self::tree_for(repo, from_oid)?;
                let to_tree = Self::tree_for(repo, to_oid)?;

                let mut opts = DiffOptions::new();
                let diff = repo
                    .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut opts))
                    .map_err(SemError::from)?;

                self.collect(
                    repo,
                    &diff,
                    |oid, _path| Self::blob_text(repo, oid),
                    |oid, _path| Self::blob_text(repo, oid),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_repository_reports_is_repo_false() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = GitBridge::discover(dir.path());
        assert!(!bridge.is_repo());
        assert!(bridge.current_branch().is_err());
    }

    #[test]
    fn sem_dir_paths_are_filtered() {
        assert!(GitBridge::is_sem_path(".sem/sem.db"));
        assert!(!GitBridge::is_sem_path("src/lib.rs"));
    }
}
