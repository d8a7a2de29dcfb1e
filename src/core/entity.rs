//! Canonical entity model shared by every extraction plugin.
//!
//! An [`Entity`] is the uniform record a plugin emits for one named,
//! locatable unit of meaning inside a file: a function, a JSON property, a
//! Markdown section, a CSV row. The matching engine (§4.3) and storage
//! layer (§4.5) only ever operate on this type, never on a plugin's
//! internal AST or parse-tree representation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Canonical entity type tag, closed per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Enum,
    Struct,
    Impl,
    Trait,
    Module,
    Constant,
    Static,
    Variable,
    Property,
    Section,
    Element,
    Row,
    Heading,
    Preamble,
    Chunk,
    Export,
}

impl EntityType {
    /// Debug label used in diagnostics and CLI table output.
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Function => "function",
            EntityType::Method => "method",
            EntityType::Class => "class",
            EntityType::Interface => "interface",
            EntityType::Type => "type",
            EntityType::Enum => "enum",
            EntityType::Struct => "struct",
            EntityType::Impl => "impl",
            EntityType::Trait => "trait",
            EntityType::Module => "module",
            EntityType::Constant => "constant",
            EntityType::Static => "static",
            EntityType::Variable => "variable",
            EntityType::Property => "property",
            EntityType::Section => "section",
            EntityType::Element => "element",
            EntityType::Row => "row",
            EntityType::Heading => "heading",
            EntityType::Preamble => "preamble",
            EntityType::Chunk => "chunk",
            EntityType::Export => "export",
        }
    }
}

/// A named, locatable unit of meaning inside a file (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id: `<filePath>::<entityType>::<name>`, or
    /// `<filePath>::<parentId>::<name>` when nested.
    pub id: String,

    /// Path relative to the repository root, forward-slash normalised.
    pub file_path: String,

    /// Canonical entity type.
    pub entity_type: EntityType,

    /// Human identifier, or an RFC-6901 / dotted path for path-structured
    /// sources.
    pub name: String,

    /// Id of the enclosing entity, if any.
    pub parent_id: Option<String>,

    /// Exact byte slice of the entity.
    pub content: String,

    /// 256-bit digest (hex) of `content` after plugin-family normalisation.
    pub content_hash: String,

    /// 1-based inclusive start line.
    pub start_line: usize,

    /// 1-based inclusive end line.
    pub end_line: usize,

    /// Optional string metadata (e.g. CSV column values).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Entity {
    /// Build the canonical id for an entity given its file, type, name, and
    /// optional parent. Nested entities are addressed through their
    /// parent's id rather than the entity type, per spec §3.
    pub fn build_id(
        file_path: &str,
        entity_type: EntityType,
        name: &str,
        parent_id: Option<&str>,
    ) -> String {
        match parent_id {
            Some(parent) => format!("{parent}::{name}"),
            None => format!("{file_path}::{}::{name}", entity_type.label()),
        }
    }

    /// Compute the SHA-256 content hash over already-normalised text.
    pub fn hash_normalized(normalized: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Lightweight hex encoder, avoiding a dependency purely for hex digits.
mod hex {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            out.push(DIGITS[(byte >> 4) as usize] as char);
            out.push(DIGITS[(byte & 0x0f) as usize] as char);
        }
        out
    }
}

/// Compute the hex-encoded SHA-256 digest of a raw string (library helper
/// `contentHash` from spec §6).
pub fn content_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// Truncate a hash (or any string) to its first `n` characters (library
/// helper `shortHash` from spec §6).
pub fn short_hash(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_id_top_level() {
        let id = Entity::build_id("src/lib.rs", EntityType::Function, "greet", None);
        assert_eq!(id, "src/lib.rs::function::greet");
    }

    #[test]
    fn build_id_nested() {
        let id = Entity::build_id(
            "src/lib.rs",
            EntityType::Method,
            "run",
            Some("src/lib.rs::struct::Worker"),
        );
        assert_eq!(id, "src/lib.rs::struct::Worker::run");
    }

    #[test]
    fn content_hash_is_deterministic() {
        let a = content_hash("fn greet() {}");
        let b = content_hash("fn greet() {}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn content_hash_differs_on_change() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn short_hash_truncates() {
        let full = content_hash("abc");
        assert_eq!(short_hash(&full, 8).len(), 8);
        assert_eq!(short_hash(&full, 8), full[..8]);
    }
}
