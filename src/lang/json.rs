//! JSON plugin: walks a parsed document up to a bounded depth, emitting one
//! entity per object key / array element, addressed by RFC-6901 pointer.

use serde_json::Value;

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::plugin::EntityPlugin;

const MAX_DEPTH: usize = 3;

/// Escape a single path segment per RFC 6901 (`~` -> `~0`, `/` -> `~1`).
fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn pointer_push(base: &str, segment: &str) -> String {
    format!("{base}/{}", escape_pointer_segment(segment))
}

pub struct JsonPlugin;

impl JsonPlugin {
    pub fn new() -> Self {
        Self
    }

    fn line_for_value(source: &str, value: &Value) -> usize {
        // Best-effort: JSON has no native source positions once parsed, so
        // single-line entities fall back to line 1. Multi-line detection is
        // intentionally simple: scalar values have exactly one line.
        let _ = (source, value);
        1
    }

    fn walk(
        &self,
        value: &Value,
        pointer: &str,
        parent_id: Option<&str>,
        depth: usize,
        file_path: &str,
        source: &str,
        out: &mut Vec<Entity>,
    ) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_pointer = pointer_push(pointer, key);
                    let name = child_pointer.clone();
                    let id = Entity::build_id(file_path, EntityType::Property, &name, parent_id);

                    let is_container = matches!(child, Value::Object(_)) && depth < MAX_DEPTH;

                    let content = serde_json::to_string_pretty(child).unwrap_or_default();
                    let entity = Entity {
                        id: id.clone(),
                        file_path: file_path.to_string(),
                        entity_type: EntityType::Property,
                        name,
                        parent_id: parent_id.map(|s| s.to_string()),
                        content: content.clone(),
                        content_hash: content_hash(content.trim()),
                        start_line: Self::line_for_value(source, child),
                        end_line: Self::line_for_value(source, child),
                        metadata: Default::default(),
                    };
                    out.push(entity);

                    if is_container {
                        self.walk(child, &child_pointer, Some(&id), depth + 1, file_path, source, out);
                    } else if let Value::Array(items) = child {
                        if depth < MAX_DEPTH {
                            self.walk_array(items, &child_pointer, Some(&id), depth + 1, file_path, source, out);
                        }
                    }
                }
            }
            Value::Array(items) => {
                self.walk_array(items, pointer, parent_id, depth, file_path, source, out);
            }
            _ => {}
        }
    }

    fn walk_array(
        &self,
        items: &[Value],
        pointer: &str,
        parent_id: Option<&str>,
        depth: usize,
        file_path: &str,
        source: &str,
        out: &mut Vec<Entity>,
    ) {
        for (index, item) in items.iter().enumerate() {
            if !matches!(item, Value::Object(_)) {
                continue;
            }
            let child_pointer = pointer_push(pointer, &index.to_string());
            let name = child_pointer.clone();
            let id = Entity::build_id(file_path, EntityType::Element, &name, parent_id);
            let content = serde_json::to_string_pretty(item).unwrap_or_default();
            out.push(Entity {
                id: id.clone(),
                file_path: file_path.to_string(),
                entity_type: EntityType::Element,
                name,
                parent_id: parent_id.map(|s| s.to_string()),
                content: content.clone(),
                content_hash: content_hash(content.trim()),
                start_line: 1,
                end_line: 1,
                metadata: Default::default(),
            });
            if depth < MAX_DEPTH {
                self.walk(item, &child_pointer, Some(&id), depth + 1, file_path, source, out);
            }
        }
    }
}

impl EntityPlugin for JsonPlugin {
    fn id(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }
        let root: Value = serde_json::from_str(source)
            .map_err(|e| SemError::parse_with_path("json", e.to_string(), file_path.to_string()))?;
        let mut entities = Vec::new();
        self.walk(&root, "", None, 0, file_path, source, &mut entities);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_object_yields_properties() {
        let plugin = JsonPlugin::new();
        let entities = plugin.extract(r#"{"version":"1.0.0"}"#, "pkg.json").unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "/version");
        assert_eq!(entities[0].entity_type, EntityType::Property);
    }

    #[test]
    fn version_change_is_detectable_via_hash() {
        let plugin = JsonPlugin::new();
        let before = plugin.extract(r#"{"version":"1.0.0"}"#, "pkg.json").unwrap();
        let after = plugin
            .extract(r#"{"version":"2.0.0","logLevel":"info"}"#, "pkg.json")
            .unwrap();
        let before_version = before.iter().find(|e| e.name == "/version").unwrap();
        let after_version = after.iter().find(|e| e.name == "/version").unwrap();
        assert_ne!(before_version.content_hash, after_version.content_hash);
        assert!(after.iter().any(|e| e.name == "/logLevel"));
    }

    #[test]
    fn pointer_escapes_tilde_and_slash() {
        let plugin = JsonPlugin::new();
        let entities = plugin.extract(r#"{"a/b":{"c~d":1}}"#, "x.json").unwrap();
        assert!(entities.iter().any(|e| e.name == "/a~1b"));
        assert!(entities.iter().any(|e| e.name == "/a~1b/c~0d"));
    }

    #[test]
    fn empty_file_yields_no_entities() {
        let plugin = JsonPlugin::new();
        assert!(plugin.extract("", "empty.json").unwrap().is_empty());
    }
}
