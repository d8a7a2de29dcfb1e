//! Markdown plugin: ATX headings (`#` through `######`) delimit sections.
//! `parentId` is the nearest enclosing heading of strictly lower level.
//! Content before the first heading becomes a single `preamble` entity.

use crate::core::entity::{content_hash, Entity, EntityType};
use crate::core::errors::Result;

use super::super::plugin::EntityPlugin;

struct Heading {
    level: usize,
    title: String,
    start_line: usize,
}

fn parse_atx_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim().to_string()))
}

pub struct MarkdownPlugin;

impl MarkdownPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl EntityPlugin for MarkdownPlugin {
    fn id(&self) -> &str {
        "markdown"
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        let lines: Vec<&str> = source.lines().collect();
        let mut headings = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if let Some((level, title)) = parse_atx_heading(line) {
                headings.push(Heading {
                    level,
                    title,
                    start_line: index + 1,
                });
            }
        }

        let mut entities = Vec::new();

        let first_heading_line = headings.first().map(|h| h.start_line).unwrap_or(lines.len() + 1);
        if first_heading_line > 1 {
            let preamble_lines = &lines[0..(first_heading_line - 1).min(lines.len())];
            let preamble_text = preamble_lines.join("\n");
            if !preamble_text.trim().is_empty() {
                let id = Entity::build_id(file_path, EntityType::Preamble, "preamble", None);
                entities.push(Entity {
                    id,
                    file_path: file_path.to_string(),
                    entity_type: EntityType::Preamble,
                    name: "preamble".to_string(),
                    parent_id: None,
                    content: preamble_text.clone(),
                    content_hash: content_hash(preamble_text.trim()),
                    start_line: 1,
                    end_line: first_heading_line.saturating_sub(1).max(1),
                    metadata: Default::default(),
                });
            }
        }

        // Stack of (level, id) for ancestor lookup: strictly-lower-level parent.
        let mut ancestor_stack: Vec<(usize, String)> = Vec::new();

        for (index, heading) in headings.iter().enumerate() {
            let end_line = headings
                .get(index + 1)
                .map(|next| next.start_line - 1)
                .unwrap_or(lines.len());

            while ancestor_stack
                .last()
                .map(|(level, _)| *level >= heading.level)
                .unwrap_or(false)
            {
                ancestor_stack.pop();
            }
            let parent_id = ancestor_stack.last().map(|(_, id)| id.clone());

            let content = lines[(heading.start_line - 1)..end_line.min(lines.len())].join("\n");
            let name = if heading.title.is_empty() {
                format!("heading_{}", heading.start_line)
            } else {
                heading.title.clone()
            };
            let id = Entity::build_id(file_path, EntityType::Heading, &name, parent_id.as_deref());

            entities.push(Entity {
                id: id.clone(),
                file_path: file_path.to_string(),
                entity_type: EntityType::Heading,
                name,
                parent_id: parent_id.clone(),
                content: content.clone(),
                content_hash: content_hash(content.trim()),
                start_line: heading.start_line,
                end_line: end_line.max(heading.start_line),
                metadata: Default::default(),
            });

            ancestor_stack.push((heading.level, id));
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_nest_by_heading_level() {
        let plugin = MarkdownPlugin::new();
        let source = "# Title\n\nintro\n\n## Sub\n\nbody\n";
        let entities = plugin.extract(source, "doc.md").unwrap();
        let title = entities.iter().find(|e| e.name == "Title").unwrap();
        let sub = entities.iter().find(|e| e.name == "Sub").unwrap();
        assert_eq!(sub.parent_id.as_deref(), Some(title.id.as_str()));
    }

    #[test]
    fn preamble_captured_when_present() {
        let plugin = MarkdownPlugin::new();
        let source = "intro text\n\n# Title\nbody\n";
        let entities = plugin.extract(source, "doc.md").unwrap();
        assert!(entities.iter().any(|e| e.entity_type == EntityType::Preamble));
    }

    #[test]
    fn no_preamble_entity_when_file_starts_with_heading() {
        let plugin = MarkdownPlugin::new();
        let entities = plugin.extract("# Title\nbody\n", "doc.md").unwrap();
        assert!(!entities.iter().any(|e| e.entity_type == EntityType::Preamble));
    }
}
