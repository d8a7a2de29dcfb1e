//! CSV/TSV plugin. Separator is `,` for `.csv`, tab for `.tsv`. The first
//! non-blank line is the header; each subsequent row becomes a `row`
//! entity with `metadata` mapping header -> cell value.

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::super::plugin::EntityPlugin;

pub struct CsvPlugin;

impl CsvPlugin {
    pub fn new() -> Self {
        Self
    }

    fn delimiter_for(file_path: &str) -> u8 {
        if file_path.ends_with(".tsv") {
            b'\t'
        } else {
            b','
        }
    }
}

impl EntityPlugin for CsvPlugin {
    fn id(&self) -> &str {
        "csv"
    }

    fn extensions(&self) -> &[&str] {
        &["csv", "tsv"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }

        let delimiter = Self::delimiter_for(file_path);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(source.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SemError::parse_with_path("csv", e.to_string(), file_path.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut entities = Vec::new();
        for (row_index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| SemError::parse_with_path("csv", e.to_string(), file_path.to_string()))?;

            let mut metadata = std::collections::HashMap::new();
            for (column, value) in headers.iter().zip(record.iter()) {
                metadata.insert(column.clone(), value.to_string());
            }

            let row_key = record
                .get(0)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("row_{row_index}"));
            let name = format!("row[{row_key}]");

            let content = record.iter().collect::<Vec<_>>().join(
                if delimiter == b'\t' { "\t" } else { "," },
            );
            let id = Entity::build_id(file_path, EntityType::Row, &name, None);
            let line = row_index + 2; // header occupies line 1

            entities.push(Entity {
                id,
                file_path: file_path.to_string(),
                entity_type: EntityType::Row,
                name,
                parent_id: None,
                content: content.clone(),
                content_hash: content_hash(content.trim()),
                start_line: line,
                end_line: line,
                metadata,
            });
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_keyed_by_first_column() {
        let plugin = CsvPlugin::new();
        let entities = plugin
            .extract("id,name\n1,Alice\n2,Bob\n", "people.csv")
            .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name, "row[1]");
        assert_eq!(entities[0].metadata.get("name"), Some(&"Alice".to_string()));
    }

    #[test]
    fn tsv_extension_uses_tab_delimiter() {
        let plugin = CsvPlugin::new();
        let entities = plugin.extract("id\tname\n1\tAlice\n", "people.tsv").unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].metadata.get("name"), Some(&"Alice".to_string()));
    }

    #[test]
    fn quoted_fields_with_embedded_commas_are_parsed() {
        let plugin = CsvPlugin::new();
        let entities = plugin
            .extract("id,note\n1,\"hello, world\"\"!\"\"\"\n", "notes.csv")
            .unwrap();
        assert_eq!(entities[0].metadata.get("note"), Some(&"hello, world\"!\"".to_string()));
    }

    #[test]
    fn missing_first_column_falls_back_to_positional_name() {
        let plugin = CsvPlugin::new();
        let entities = plugin.extract("id,name\n,Alice\n", "people.csv").unwrap();
        assert_eq!(entities[0].name, "row[row_0]");
    }
}
