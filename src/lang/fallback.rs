//! Fallback plugin: partitions any file into fixed-size line chunks so
//! every file has *some* diffable entities, even binary or unrecognised
//! ones.

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::Result;

use super::plugin::EntityPlugin;

const CHUNK_SIZE: usize = 20;

pub struct FallbackPlugin;

impl FallbackPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl EntityPlugin for FallbackPlugin {
    fn id(&self) -> &str {
        "fallback"
    }

    fn extensions(&self) -> &[&str] {
        &[]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        if source.is_empty() {
            return Ok(Vec::new());
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut entities = Vec::new();

        for (chunk_index, chunk) in lines.chunks(CHUNK_SIZE).enumerate() {
            let start_line = chunk_index * CHUNK_SIZE + 1;
            let end_line = start_line + chunk.len() - 1;
            let name = format!("lines {start_line}-{end_line}");
            let content = chunk.join("\n");
            let id = Entity::build_id(file_path, EntityType::Chunk, &name, None);

            entities.push(Entity {
                id,
                file_path: file_path.to_string(),
                entity_type: EntityType::Chunk,
                name,
                parent_id: None,
                content: content.clone(),
                content_hash: content_hash(&content),
                start_line,
                end_line,
                metadata: Default::default(),
            });
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_file_into_twenty_line_windows() {
        let plugin = FallbackPlugin::new();
        let source = (1..=45).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let entities = plugin.extract(&source, "data.bin").unwrap();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].name, "lines 1-20");
        assert_eq!(entities[1].name, "lines 21-40");
        assert_eq!(entities[2].name, "lines 41-45");
    }

    #[test]
    fn empty_file_yields_zero_chunks() {
        let plugin = FallbackPlugin::new();
        assert!(plugin.extract("", "empty.bin").unwrap().is_empty());
    }

    #[test]
    fn tolerates_invalid_utf8_like_noisy_content() {
        let plugin = FallbackPlugin::new();
        let entities = plugin.extract("\u{FFFD}\u{FFFD}\nbinary\n", "weird.bin").unwrap();
        assert_eq!(entities.len(), 1);
    }
}
