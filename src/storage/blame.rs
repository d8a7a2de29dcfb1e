//! Blame: attribute each entity in a file's current version to the commit
//! that last changed it, per spec §4.5.

use std::collections::HashMap;

use crate::core::entity::Entity;
use crate::core::errors::Result;
use crate::lang::registry::ParserRegistry;
use crate::vcs::GitBridge;

#[derive(Debug, Clone)]
pub struct BlameEntry {
    pub entity_id: String,
    pub entity_name: String,
    pub commit_sha: String,
    pub author: Option<String>,
    pub timestamp: Option<i64>,
}

/// For `file_path`'s current entities, walk commits newest-first up to
/// `max_depth`; the first commit where an entity's hash differs from the
/// next-older version (or the entity is freshly present) is its blame
/// commit. Stops early once every entity is attributed.
pub fn blame_file(
    bridge: &GitBridge,
    registry: &ParserRegistry,
    file_path: &str,
    max_depth: usize,
) -> Result<Vec<BlameEntry>> {
    let history = bridge.commit_history_for_path(file_path, max_depth)?;
    if history.is_empty() {
        return Ok(Vec::new());
    }

    let current_entities = match &history[0].content {
        Some(content) => registry.extract(content, file_path)?,
        None => Vec::new(),
    };

    let mut unattributed: HashMap<String, Entity> =
        current_entities.into_iter().map(|e| (e.id.clone(), e)).collect();
    let mut blame: HashMap<String, BlameEntry> = HashMap::new();

    for window in history.windows(2) {
        if unattributed.is_empty() {
            break;
        }
        let newer = &window[0];
        let older = &window[1];

        let newer_entities = match &newer.content {
            Some(content) => registry.extract(content, file_path)?,
            None => Vec::new(),
        };
        let older_entities: HashMap<String, String> = match &older.content {
            Some(content) => registry
                .extract(content, file_path)?
                .into_iter()
                .map(|e| (e.id, e.content_hash))
                .collect(),
            None => HashMap::new(),
        };

        for entity in newer_entities {
            if !unattributed.contains_key(&entity.id) {
                continue;
            }
            let changed_here = match older_entities.get(&entity.id) {
                Some(older_hash) => *older_hash != entity.content_hash,
                None => true,
            };
            if changed_here {
                unattributed.remove(&entity.id);
                blame.insert(
                    entity.id.clone(),
                    BlameEntry {
                        entity_id: entity.id,
                        entity_name: entity.name,
                        commit_sha: newer.sha.clone(),
                        author: newer.author.clone(),
                        timestamp: newer.timestamp,
                    },
                );
            }
        }
    }

    // Anything never attributed within max_depth is attributed to the
    // oldest commit walked (it predates the walk's visibility).
    if let Some(oldest) = history.last() {
        for (id, entity) in unattributed {
            blame.insert(
                id.clone(),
                BlameEntry {
                    entity_id: id,
                    entity_name: entity.name,
                    commit_sha: oldest.sha.clone(),
                    author: oldest.author.clone(),
                    timestamp: oldest.timestamp,
                },
            );
        }
    }

    let mut out: Vec<BlameEntry> = blame.into_values().collect();
    out.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    Ok(out)
}
