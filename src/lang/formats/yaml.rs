//! YAML plugin: dot-joined key paths, mapping nodes become `section`
//! entities, primitive leaves become `property` entities.

use serde_yaml::Value;

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::super::plugin::EntityPlugin;

const MAX_DEPTH: usize = 4;

fn find_line(source: &str, key: &str) -> usize {
    let prefix = format!("{key}:");
    for (index, line) in source.lines().enumerate() {
        if line.trim_start() == prefix || line.trim_start().starts_with(&format!("{prefix} ")) {
            return index + 1;
        }
    }
    1
}

fn value_to_yaml_string(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_default().trim().to_string()
}

pub struct YamlPlugin;

impl YamlPlugin {
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
        let Value::Mapping(map) = value else {
            return;
        };
        for (key, child) in map {
            let Some(key_str) = key.as_str().map(str::to_string).or_else(|| {
                serde_yaml::to_string(key).ok().map(|s| s.trim().to_string())
            }) else {
                continue;
            };
            let name = if path.is_empty() {
                key_str.clone()
            } else {
                format!("{path}.{key_str}")
            };

            let is_mapping = matches!(child, Value::Mapping(_));
            let entity_type = if is_mapping {
                EntityType::Section
            } else {
                EntityType::Property
            };

            let content = value_to_yaml_string(child);

            let id = Entity::build_id(file_path, entity_type, &name, parent_id);
            let line = find_line(source, &key_str);

            out.push(Entity {
                id: id.clone(),
                file_path: file_path.to_string(),
                entity_type,
                name,
                parent_id: parent_id.map(|s| s.to_string()),
                content: content.clone(),
                content_hash: content_hash(content.trim()),
                start_line: line,
                end_line: line,
                metadata: Default::default(),
            });

            if is_mapping && depth < MAX_DEPTH {
                self.walk(child, &name, Some(&id), depth + 1, file_path, source, out);
            }
        }
    }
}

impl EntityPlugin for YamlPlugin {
    fn id(&self) -> &str {
        "yaml"
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }
        let root: Value = serde_yaml::from_str(source)
            .map_err(|e| SemError::parse_with_path("yaml", e.to_string(), file_path.to_string()))?;
        let mut entities = Vec::new();
        self.walk(&root, "", None, 0, file_path, source, &mut entities);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_addition_is_detected() {
        let plugin = YamlPlugin::new();
        let before = plugin
            .extract("server:\n  host: localhost\n", "config.yml")
            .unwrap();
        let after = plugin
            .extract(
                "server:\n  host: 0.0.0.0\ndatabase:\n  pool_size: 10\n",
                "config.yml",
            )
            .unwrap();

        let before_host = before.iter().find(|e| e.name == "server.host").unwrap();
        let after_host = after.iter().find(|e| e.name == "server.host").unwrap();
        assert_ne!(before_host.content_hash, after_host.content_hash);

        assert!(after.iter().any(|e| e.name == "database"));
        assert!(after.iter().any(|e| e.name == "database.pool_size"));
    }

    #[test]
    fn mapping_becomes_section_leaf_becomes_property() {
        let plugin = YamlPlugin::new();
        let entities = plugin.extract("a:\n  b: 1\n", "x.yml").unwrap();
        let section = entities.iter().find(|e| e.name == "a").unwrap();
        let property = entities.iter().find(|e| e.name == "a.b").unwrap();
        assert_eq!(section.entity_type, EntityType::Section);
        assert_eq!(property.entity_type, EntityType::Property);
        assert_eq!(property.parent_id.as_deref(), Some(section.id.as_str()));
    }
}
