//! Change and file-change models produced by the matcher and orchestrator.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityType};

/// Kind of change a matched or unmatched entity pair represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Moved,
    Renamed,
}

/// A single semantic change between two revisions of an entity (spec §3 /
/// §6 wire shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticChange {
    /// Internal id: `<phase>::<index>`, unique within one diff run.
    pub id: String,

    /// The surviving entity's id: `after.id` for added/modified/moved/
    /// renamed, `before.id` for deleted.
    pub entity_id: String,

    pub change_type: ChangeType,

    pub entity_type: EntityType,

    pub entity_name: String,

    /// Current file path (after-side for everything but `deleted`).
    pub file_path: String,

    /// Present when the entity's file path changed (`moved`) or, per the
    /// scenario in spec §8, on any change carrying a renamed/moved entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_file_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Jaccard token similarity that produced a phase-3 match; `None` for
    /// identity/hash matches and for added/deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl SemanticChange {
    pub fn added(id: String, after: &Entity) -> Self {
        Self {
            id,
            entity_id: after.id.clone(),
            change_type: ChangeType::Added,
            entity_type: after.entity_type,
            entity_name: after.name.clone(),
            file_path: after.file_path.clone(),
            old_file_path: None,
            before_content: None,
            after_content: Some(after.content.clone()),
            commit_sha: None,
            author: None,
            timestamp: None,
            similarity: None,
        }
    }

    pub fn deleted(id: String, before: &Entity) -> Self {
        Self {
            id,
            entity_id: before.id.clone(),
            change_type: ChangeType::Deleted,
            entity_type: before.entity_type,
            entity_name: before.name.clone(),
            file_path: before.file_path.clone(),
            old_file_path: None,
            before_content: Some(before.content.clone()),
            after_content: None,
            commit_sha: None,
            author: None,
            timestamp: None,
            similarity: None,
        }
    }

    pub fn modified(id: String, before: &Entity, after: &Entity) -> Self {
        Self {
            id,
            entity_id: after.id.clone(),
            change_type: ChangeType::Modified,
            entity_type: after.entity_type,
            entity_name: after.name.clone(),
            file_path: after.file_path.clone(),
            old_file_path: None,
            before_content: Some(before.content.clone()),
            after_content: Some(after.content.clone()),
            commit_sha: None,
            author: None,
            timestamp: None,
            similarity: None,
        }
    }

    pub fn moved(id: String, before: &Entity, after: &Entity) -> Self {
        let mut change = Self::modified(id, before, after);
        change.change_type = ChangeType::Moved;
        if before.file_path != after.file_path {
            change.old_file_path = Some(before.file_path.clone());
        }
        change
    }

    pub fn renamed(id: String, before: &Entity, after: &Entity, similarity: Option<f64>) -> Self {
        let mut change = Self::modified(id, before, after);
        change.change_type = ChangeType::Renamed;
        change.similarity = similarity;
        change
    }

    /// Attach VCS provenance, mirroring the orchestrator's post-match
    /// tagging step.
    pub fn with_provenance(
        mut self,
        commit_sha: Option<String>,
        author: Option<String>,
        timestamp: Option<i64>,
    ) -> Self {
        self.commit_sha = commit_sha;
        self.author = author;
        self.timestamp = timestamp;
        self
    }
}

/// File-level status derived from the VCS bridge, independent of entity
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// One changed file as reported by the VCS bridge, feeding the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub file_path: String,

    pub status: FileStatus,

    /// Path before the change, populated for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_file_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_content: Option<String>,
}

impl FileChange {
    /// The path entities extracted from `before_content` should be tagged
    /// with. For a rename this is the *old* path, so the matcher sees the
    /// before-side id carrying the old location (spec §4.4).
    pub fn before_path(&self) -> &str {
        self.old_file_path.as_deref().unwrap_or(&self.file_path)
    }

    /// The path entities extracted from `after_content` should be tagged
    /// with.
    pub fn after_path(&self) -> &str {
        &self.file_path
    }
}

/// Which revisions a diff run compares, mirroring the VCS bridge's scope
/// detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DiffScope {
    Working,
    Staged,
    Commit { sha: String },
    Range { from: String, to: String },
}

/// `summary` block of the §6 JSON output schema.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub file_count: usize,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub moved: usize,
    pub renamed: usize,
    pub total: usize,
}

/// Aggregate result of one diff run (the §6 JSON schema's top-level shape).
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    #[serde(skip)]
    pub scope: DiffScope,
    pub summary: DiffSummary,
    pub changes: Vec<SemanticChange>,
}

impl DiffResult {
    /// `file_count` is the number of distinct files that contributed at
    /// least one change (spec §4.4's "deduplicated set of files").
    pub fn new(scope: DiffScope, changes: Vec<SemanticChange>) -> Self {
        let mut summary = DiffSummary::default();
        let mut files = std::collections::HashSet::new();
        for change in &changes {
            files.insert(change.file_path.clone());
            summary.total += 1;
            match change.change_type {
                ChangeType::Added => summary.added += 1,
                ChangeType::Modified => summary.modified += 1,
                ChangeType::Deleted => summary.deleted += 1,
                ChangeType::Moved => summary.moved += 1,
                ChangeType::Renamed => summary.renamed += 1,
            }
        }
        summary.file_count = files.len();
        Self {
            scope,
            summary,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityType;

    fn sample_entity(file_path: &str, name: &str) -> Entity {
        Entity {
            id: Entity::build_id(file_path, EntityType::Function, name, None),
            file_path: file_path.to_string(),
            entity_type: EntityType::Function,
            name: name.to_string(),
            parent_id: None,
            content: "fn foo() {}".to_string(),
            content_hash: super::super::entity::content_hash("fn foo() {}"),
            start_line: 1,
            end_line: 1,
            metadata: Default::default(),
        }
    }

    #[test]
    fn diff_result_tallies_change_types() {
        let a = sample_entity("a.rs", "a");
        let b = sample_entity("b.rs", "b");
        let changes = vec![
            SemanticChange::added("0".to_string(), &a),
            SemanticChange::deleted("1".to_string(), &b),
            SemanticChange::modified("2".to_string(), &a, &b),
        ];
        let result = DiffResult::new(DiffScope::Working, changes);
        assert_eq!(result.summary.added, 1);
        assert_eq!(result.summary.deleted, 1);
        assert_eq!(result.summary.modified, 1);
        assert_eq!(result.summary.moved, 0);
        assert_eq!(result.summary.renamed, 0);
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.file_count, 2);
    }

    #[test]
    fn file_change_before_after_paths() {
        let added = FileChange {
            file_path: "new.rs".to_string(),
            status: FileStatus::Added,
            old_file_path: None,
            before_content: None,
            after_content: Some("fn a() {}".to_string()),
        };
        assert_eq!(added.before_path(), "new.rs");
        assert_eq!(added.after_path(), "new.rs");

        let renamed = FileChange {
            file_path: "new.rs".to_string(),
            status: FileStatus::Renamed,
            old_file_path: Some("old.rs".to_string()),
            before_content: Some("fn a() {}".to_string()),
            after_content: Some("fn a() {}".to_string()),
        };
        assert_eq!(renamed.before_path(), "old.rs");
        assert_eq!(renamed.after_path(), "new.rs");
    }
}
