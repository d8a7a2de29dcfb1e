//! Diff orchestrator: per-file dispatch through the parser registry and
//! matcher, fanned out over a `rayon` worker pool (spec §4.4, §5).

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::core::change::{DiffResult, DiffScope, FileChange, SemanticChange};
use crate::core::config::SemConfig;
use crate::core::errors::{Result, SemError};
use crate::lang::registry::ParserRegistry;
use crate::matching::engine::match_entities;

/// Compute the semantic diff for a batch of changed files, tagging every
/// resulting change with `commit_sha`/`author` if supplied.
///
/// Per-file parse and match work is fanned out over a `rayon` pool sized by
/// `config.performance.worker_threads` (spec §5); `cancel` is checked at
/// each file boundary and, if set, aborts the whole run with
/// [`SemError::Cancelled`] rather than returning a partial result.
pub fn compute_semantic_diff(
    files: &[FileChange],
    registry: &ParserRegistry,
    scope: DiffScope,
    commit_sha: Option<&str>,
    author: Option<&str>,
    cancel: &AtomicBool,
    config: &SemConfig,
) -> Result<DiffResult> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.resolved_worker_threads())
        .build()
        .map_err(|e| SemError::internal(format!("failed to build worker pool: {e}")))?;

    let per_file: Vec<Result<Vec<SemanticChange>>> = pool.install(|| {
        files
            .par_iter()
            .enumerate()
            .map(|(index, file)| process_file(index, file, registry, commit_sha, author, cancel, config))
            .collect()
    });

    let mut changes = Vec::new();
    for result in per_file {
        changes.extend(result?);
    }

    Ok(DiffResult::new(scope, changes))
}

fn process_file(
    index: usize,
    file: &FileChange,
    registry: &ParserRegistry,
    commit_sha: Option<&str>,
    author: Option<&str>,
    cancel: &AtomicBool,
    config: &SemConfig,
) -> Result<Vec<SemanticChange>> {
    if cancel.load(Ordering::Relaxed) {
        return Err(SemError::Cancelled);
    }

    let before_entities = match &file.before_content {
        Some(content) => extract_or_empty(registry, content, file.before_path()),
        None => Vec::new(),
    };
    let after_entities = match &file.after_content {
        Some(content) => extract_or_empty(registry, content, file.after_path()),
        None => Vec::new(),
    };

    let mut changes = match_entities(
        before_entities,
        after_entities,
        None,
        Some(config.matching.fuzzy_threshold),
    );
    for change in &mut changes {
        // Scope the per-file phase-local id to the file's position in the
        // batch, preserving spec §5's file-then-phase-then-insertion order.
        change.id = format!("{index}::{}", change.id);
    }

    Ok(changes
        .into_iter()
        .map(|c| c.with_provenance(commit_sha.map(str::to_string), author.map(str::to_string), None))
        .collect())
}

/// A parse failure is local to one side of one file; it never propagates
/// to sibling files (spec §4.4).
fn extract_or_empty(registry: &ParserRegistry, content: &str, file_path: &str) -> Vec<crate::core::entity::Entity> {
    match registry.extract(content, file_path) {
        Ok(entities) => entities,
        Err(err) => {
            tracing::warn!(file_path, error = %err, "entity extraction failed, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change::FileStatus;

    #[test]
    fn parse_failure_on_one_side_does_not_abort_the_batch() {
        let registry = ParserRegistry::with_builtins();
        let files = vec![FileChange {
            file_path: "config.json".to_string(),
            status: FileStatus::Modified,
            old_file_path: None,
            before_content: Some("{not json".to_string()),
            after_content: Some(r#"{"version": "2.0.0"}"#.to_string()),
        }];

        let cancel = AtomicBool::new(false);
        let config = SemConfig::default();
        let result =
            compute_semantic_diff(&files, &registry, DiffScope::Working, None, None, &cancel, &config)
                .unwrap();
        assert!(result.summary.total >= 1);
    }

    #[test]
    fn cancellation_aborts_the_whole_run() {
        let registry = ParserRegistry::with_builtins();
        let files = vec![FileChange {
            file_path: "a.rs".to_string(),
            status: FileStatus::Added,
            old_file_path: None,
            before_content: None,
            after_content: Some("fn a(){}".to_string()),
        }];

        let cancel = AtomicBool::new(true);
        let config = SemConfig::default();
        let result =
            compute_semantic_diff(&files, &registry, DiffScope::Working, None, None, &cancel, &config);
        assert!(matches!(result, Err(SemError::Cancelled)));
    }

    #[test]
    fn multiple_files_produce_distinct_change_ids() {
        let registry = ParserRegistry::with_builtins();
        let files = vec![
            FileChange {
                file_path: "a.rs".to_string(),
                status: FileStatus::Added,
                old_file_path: None,
                before_content: None,
                after_content: Some("fn a(){}".to_string()),
            },
            FileChange {
                file_path: "b.rs".to_string(),
                status: FileStatus::Added,
                old_file_path: None,
                before_content: None,
                after_content: Some("fn b(){}".to_string()),
            },
        ];

        let cancel = AtomicBool::new(false);
        let config = SemConfig::default();
        let result =
            compute_semantic_diff(&files, &registry, DiffScope::Working, None, None, &cancel, &config)
                .unwrap();
        let ids: std::collections::HashSet<_> = result.changes.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), result.changes.len());
    }
}
