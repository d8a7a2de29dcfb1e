//! Three-phase entity matcher: identity, structural hash, fuzzy similarity.
//!
//! Given `before` and `after` entity lists for one file, produces the
//! ordered list of [`SemanticChange`]s per the phase rules: phase N+1 only
//! ever considers the residual left unmatched by phase N, and unmatched
//! residuals at the end become terminal `added`/`deleted` changes.

use indexmap::IndexMap;

use crate::core::change::SemanticChange;
use crate::core::entity::{Entity, EntityType};

use super::similarity::{jaccard_token_similarity, SimilarityFn};

/// Default minimum similarity score for a phase-3 fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.80;

/// FIFO queue of still-unmatched entities, indexed by a key (content hash
/// for phase 2, nothing for phase 3's linear scan). Preserves insertion
/// order so tie-breaking is deterministic.
struct Residual {
    entities: Vec<Option<Entity>>,
}

impl Residual {
    fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities: entities.into_iter().map(Some).collect(),
        }
    }

    fn take_remaining(&mut self) -> Vec<Entity> {
        self.entities.drain(..).flatten().collect()
    }
}

struct PhaseCounter {
    phase: &'static str,
    index: usize,
}

impl PhaseCounter {
    fn new(phase: &'static str) -> Self {
        Self { phase, index: 0 }
    }

    fn next_id(&mut self) -> String {
        let id = format!("{}::{}", self.phase, self.index);
        self.index += 1;
        id
    }
}

/// Run the three-phase matcher over one file's before/after entity lists.
/// `similarity` defaults to [`jaccard_token_similarity`] and `fuzzy_threshold`
/// to [`DEFAULT_FUZZY_THRESHOLD`] when `None`.
pub fn match_entities(
    before: Vec<Entity>,
    after: Vec<Entity>,
    similarity: Option<SimilarityFn>,
    fuzzy_threshold: Option<f64>,
) -> Vec<SemanticChange> {
    let similarity = similarity.unwrap_or(jaccard_token_similarity);
    let fuzzy_threshold = fuzzy_threshold.unwrap_or(DEFAULT_FUZZY_THRESHOLD);
    let mut changes = Vec::new();
    let mut counter = PhaseCounter::new("identity");

    // Phase 1 — exact identity match on `id`. `IndexMap` preserves the
    // original `before` insertion order in the still-unmatched residual, so
    // later phases (and the terminal `deleted` emission) never depend on a
    // `HashMap`'s randomized iteration order.
    let mut before_by_id: IndexMap<String, Entity> =
        before.into_iter().map(|e| (e.id.clone(), e)).collect();
    let mut after_remaining = Vec::new();

    for after_entity in after {
        match before_by_id.shift_remove(&after_entity.id) {
            Some(before_entity) => {
                if before_entity.content_hash != after_entity.content_hash {
                    changes.push(SemanticChange::modified(
                        counter.next_id(),
                        &before_entity,
                        &after_entity,
                    ));
                }
                // Identical hash: unchanged, silent per phase-1 rule.
            }
            None => after_remaining.push(after_entity),
        }
    }
    let before_remaining: Vec<Entity> = before_by_id.into_values().collect();

    // Phase 2 — structural hash, many-to-one FIFO queues per hash. Queue
    // insertion order mirrors `before_remaining`'s order, and `IndexMap`
    // keeps that order explicit rather than relying on a hasher's layout.
    counter = PhaseCounter::new("hash");
    let mut queues: IndexMap<String, Vec<Entity>> = IndexMap::new();
    for entity in before_remaining {
        queues.entry(entity.content_hash.clone()).or_default().push(entity);
    }

    let mut still_unmatched_after = Vec::new();
    for after_entity in after_remaining {
        let popped = queues
            .get_mut(&after_entity.content_hash)
            .filter(|q| !q.is_empty())
            .map(|q| q.remove(0));

        match popped {
            Some(before_entity) => {
                let change = if before_entity.file_path != after_entity.file_path {
                    SemanticChange::moved(counter.next_id(), &before_entity, &after_entity)
                } else {
                    SemanticChange::renamed(counter.next_id(), &before_entity, &after_entity, None)
                };
                changes.push(change);
            }
            None => still_unmatched_after.push(after_entity),
        }
    }
    let before_remaining: Vec<Entity> = queues.into_values().flatten().collect();

    // Phase 3 — fuzzy similarity, greedy per spec's Open Question (b): each
    // `after` entity adopts its single best-scoring `before` entity above
    // threshold; that `before` is then unavailable for later `after`s. This
    // does not maximise total similarity across all pairs.
    counter = PhaseCounter::new("fuzzy");
    let mut before_pool = Residual::new(before_remaining);
    let mut final_added = Vec::new();

    for after_entity in still_unmatched_after {
        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in before_pool.entities.iter().enumerate() {
            let Some(candidate) = candidate else { continue };
            if candidate.entity_type != after_entity.entity_type {
                continue;
            }
            let score = similarity(&candidate.content, &after_entity.content);
            let better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if score >= fuzzy_threshold && better {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) => {
                let before_entity = before_pool.entities[index].take().unwrap();
                let change = if before_entity.file_path != after_entity.file_path {
                    SemanticChange::moved(counter.next_id(), &before_entity, &after_entity)
                } else {
                    SemanticChange::renamed(counter.next_id(), &before_entity, &after_entity, Some(score))
                };
                changes.push(change);
            }
            None => final_added.push(after_entity),
        }
    }

    // Terminal phase — residual before -> deleted, residual after -> added.
    counter = PhaseCounter::new("deleted");
    for entity in before_pool.take_remaining() {
        changes.push(SemanticChange::deleted(counter.next_id(), &entity));
    }
    counter = PhaseCounter::new("added");
    for entity in final_added {
        changes.push(SemanticChange::added(counter.next_id(), &entity));
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change::ChangeType;

    fn entity(file_path: &str, entity_type: EntityType, name: &str, content: &str) -> Entity {
        let hash = crate::core::entity::content_hash(content);
        Entity {
            id: Entity::build_id(file_path, entity_type, name, None),
            file_path: file_path.to_string(),
            entity_type,
            name: name.to_string(),
            parent_id: None,
            content: content.to_string(),
            content_hash: hash,
            start_line: 1,
            end_line: 1,
            metadata: Default::default(),
        }
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let e = entity("a.ts", EntityType::Function, "greet", "function greet(){}");
        let changes = match_entities(vec![e.clone()], vec![e], None, None);
        assert!(changes.is_empty());
    }

    #[test]
    fn only_additions_yield_added_for_every_entity() {
        let a = entity("a.ts", EntityType::Function, "a", "function a(){}");
        let b = entity("a.ts", EntityType::Function, "b", "function b(){}");
        let changes = match_entities(vec![], vec![a, b], None, None);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Added));
    }

    #[test]
    fn only_deletions_yield_deleted_for_every_entity() {
        let a = entity("a.ts", EntityType::Function, "a", "function a(){}");
        let b = entity("a.ts", EntityType::Function, "b", "function b(){}");
        let changes = match_entities(vec![a, b], vec![], None, None);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Deleted));
    }

    #[test]
    fn exact_modification_is_detected() {
        let before = entity(
            "test.ts",
            EntityType::Function,
            "greet",
            "function greet(){return 'hi';}",
        );
        let after = entity(
            "test.ts",
            EntityType::Function,
            "greet",
            "function greet(){return 'hello';}",
        );
        let changes = match_entities(vec![before], vec![after], None, None);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Modified);
        assert_eq!(changes[0].entity_name, "greet");
    }

    #[test]
    fn rename_detected_via_hash_equality() {
        let content = "function greet(){return 'hi';}";
        let before = entity("test.ts", EntityType::Function, "greet", content);
        let after = entity("test.ts", EntityType::Function, "sayHello", content);
        let changes = match_entities(vec![before], vec![after], None, None);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Renamed);
        assert_eq!(changes[0].entity_name, "sayHello");
    }

    #[test]
    fn move_detected_across_files_via_hash_equality() {
        let content = "function greet(){return 'hi';}";
        let before = entity("old.ts", EntityType::Function, "greet", content);
        let after = entity("new.ts", EntityType::Function, "greet", content);
        let changes = match_entities(vec![before], vec![after], None, None);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Moved);
        assert_eq!(changes[0].old_file_path.as_deref(), Some("old.ts"));
    }

    #[test]
    fn fuzzy_rename_above_threshold_is_detected() {
        let before_content = "function calculateTotal(items) { return items.reduce((a, b) => a + b, 0); }";
        let after_content = "function computeTotal(items) { return items.reduce((a, b) => a + b, 0); }";
        let before = entity("math.ts", EntityType::Function, "calculateTotal", before_content);
        let after = entity("math.ts", EntityType::Function, "computeTotal", after_content);
        let changes = match_entities(vec![before], vec![after], None, None);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Renamed);
        assert!(changes[0].similarity.unwrap() >= 0.80);
    }

    #[test]
    fn no_entity_appears_in_more_than_one_change() {
        let shared_content = "const x = 1;";
        let before = vec![
            entity("a.ts", EntityType::Variable, "x", shared_content),
            entity("a.ts", EntityType::Variable, "y", shared_content),
        ];
        let after = vec![entity("a.ts", EntityType::Variable, "z", shared_content)];
        let changes = match_entities(before, after, None, None);
        // Exactly one hash-match pairing consumes one before entity; the
        // other before entity is deleted.
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn hash_phase_pairing_is_stable_across_repeated_runs() {
        // Two `before` entities share a hash; only one can pair with the
        // single `after` entity. The FIFO queue must always pick the first
        // one inserted (`x`), never depending on hashmap iteration order.
        let shared_content = "const x = 1;";
        let before = vec![
            entity("a.ts", EntityType::Variable, "x", shared_content),
            entity("a.ts", EntityType::Variable, "y", shared_content),
        ];
        let after = vec![entity("b.ts", EntityType::Variable, "z", shared_content)];

        for _ in 0..20 {
            let changes = match_entities(before.clone(), after.clone(), None, None);
            let moved = changes.iter().find(|c| c.change_type == ChangeType::Moved).unwrap();
            assert_eq!(moved.old_file_path.as_deref(), Some("a.ts"));
            let deleted = changes.iter().find(|c| c.change_type == ChangeType::Deleted).unwrap();
            assert_eq!(deleted.entity_name, "y");
        }
    }

    #[test]
    fn reordering_inputs_does_not_change_emitted_set() {
        let a = entity("a.ts", EntityType::Function, "a", "function a(){1}");
        let b = entity("a.ts", EntityType::Function, "b", "function b(){2}");
        let forward = match_entities(vec![], vec![a.clone(), b.clone()], None, None);
        let reversed = match_entities(vec![], vec![b, a], None, None);
        let mut forward_names: Vec<_> = forward.iter().map(|c| c.entity_name.clone()).collect();
        let mut reversed_names: Vec<_> = reversed.iter().map(|c| c.entity_name.clone()).collect();
        forward_names.sort();
        reversed_names.sort();
        assert_eq!(forward_names, reversed_names);
    }
}
