//! History: track one entity backward through commits, recording
//! added/modified/deleted transitions whenever its presence or hash flips,
//! per spec §4.5.

use crate::core::change::ChangeType;
use crate::core::errors::Result;
use crate::lang::registry::ParserRegistry;
use crate::vcs::GitBridge;

#[derive(Debug, Clone)]
pub struct HistoryTransition {
    pub commit_sha: String,
    pub change_type: ChangeType,
    pub author: Option<String>,
    pub timestamp: Option<i64>,
}

/// `query` matches either the entity's full id or its bare name.
pub fn entity_history(
    bridge: &GitBridge,
    registry: &ParserRegistry,
    file_path: &str,
    query: &str,
    max_depth: usize,
) -> Result<Vec<HistoryTransition>> {
    let history = bridge.commit_history_for_path(file_path, max_depth)?;

    let mut prev_hash: Option<String> = None;
    let mut transitions = Vec::new();

    // Walk oldest-first so transitions are detected in chronological
    // order, then present the result newest-first (spec's "track backward
    // through commits").
    for snapshot in history.iter().rev() {
        let hash = match &snapshot.content {
            Some(content) => registry
                .extract(content, file_path)?
                .into_iter()
                .find(|e| e.id == query || e.name == query)
                .map(|e| e.content_hash),
            None => None,
        };

        let change_type = match (&prev_hash, &hash) {
            (None, Some(_)) => Some(ChangeType::Added),
            (Some(_), None) => Some(ChangeType::Deleted),
            (Some(old), Some(new)) if old != new => Some(ChangeType::Modified),
            _ => None,
        };

        if let Some(change_type) = change_type {
            transitions.push(HistoryTransition {
                commit_sha: snapshot.sha.clone(),
                change_type,
                author: snapshot.author.clone(),
                timestamp: snapshot.timestamp,
            });
        }

        prev_hash = hash;
    }

    transitions.reverse();
    Ok(transitions)
}
