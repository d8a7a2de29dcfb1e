//! TOML plugin: identical shape to the YAML plugin, with a line heuristic
//! that additionally matches `[<key>]` table headers and `<key>=` forms.

use toml::Value;

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::super::plugin::EntityPlugin;

const MAX_DEPTH: usize = 4;

fn find_line(source: &str, key: &str) -> usize {
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed == format!("[{key}]")
            || trimmed.starts_with(&format!("{key} ="))
            || trimmed.starts_with(&format!("{key}="))
        {
            return index + 1;
        }
    }
    1
}

fn value_to_toml_string(value: &Value) -> String {
    toml::to_string_pretty(value).unwrap_or_default().trim().to_string()
}

pub struct TomlPlugin;

impl TomlPlugin {
    pub fn new() -> Self {
        Self
    }

    fn walk(
        &self,
        value: &Value,
        path: &str,
        parent_id: Option<&str>,
        depth: usize,
        file_path: &str,
        source: &str,
        out: &mut Vec<Entity>,
    ) {
        let Value::Table(map) = value else {
            return;
        };
        for (key, child) in map {
            let name = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };

            let is_table = matches!(child, Value::Table(_));
            let entity_type = if is_table {
                EntityType::Section
            } else {
                EntityType::Property
            };

            let content = value_to_toml_string(child);
            let id = Entity::build_id(file_path, entity_type, &name, parent_id);
            let line = find_line(source, key);

            out.push(Entity {
                id: id.clone(),
                file_path: file_path.to_string(),
                entity_type,
                name: name.clone(),
                parent_id: parent_id.map(|s| s.to_string()),
                content: content.clone(),
                content_hash: content_hash(content.trim()),
                start_line: line,
                end_line: line,
                metadata: Default::default(),
            });

            if is_table && depth < MAX_DEPTH {
                self.walk(child, &name, Some(&id), depth + 1, file_path, source, out);
            }
        }
    }
}

impl EntityPlugin for TomlPlugin {
    fn id(&self) -> &str {
        "toml"
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }
        let root: Value = source
            .parse()
            .map_err(|e: toml::de::Error| SemError::parse_with_path("toml", e.to_string(), file_path.to_string()))?;
        let mut entities = Vec::new();
        self.walk(&root, "", None, 0, file_path, source, &mut entities);
        Ok(entities)
    }
}
