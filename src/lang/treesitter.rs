//! Generic, configuration-driven tree-sitter extraction plugin.
//!
//! Every tree-sitter-backed language is the *same* plugin parameterized by
//! a [`LanguageConfig`] table, rather than one hand-written struct per
//! language. A language's grammar quirks (what node kinds are entities,
//! where the name lives, which nodes establish a function scope) are data,
//! not code.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser};

use crate::core::ast_utils::{find_child_by_kind, find_descendant_by_kind, node_text_normalized, to_line_number};
use crate::core::entity::{Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::plugin::EntityPlugin;

/// One (tree-sitter node kind -> canonical entity type) mapping entry.
#[derive(Debug, Clone, Copy)]
pub struct EntityRule {
    pub node_kind: &'static str,
    pub entity_type: EntityType,
}

/// Per-language parameterization of [`TreeSitterPlugin`].
#[derive(Clone)]
pub struct LanguageConfig {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> Language,
    pub entity_rules: &'static [EntityRule],
    /// Field name tree-sitter exposes for an entity's identifier, tried
    /// before any fallback kind (most grammars call it `"name"`).
    pub name_field: &'static str,
    /// Node kinds to search for an identifier when `name_field` is absent
    /// on the node itself (e.g. Go's `identifier`, C's `declarator` chain).
    pub name_fallback_kinds: &'static [&'static str],
    /// Wrapper node kinds that are transparent for entity purposes: the
    /// walker looks through them for named children and does not emit a
    /// `variable`/`export` entity itself unless explicitly mapped.
    pub transparent_wrapper_kinds: &'static [&'static str],
    /// Node kinds that open a function-local scope; `variable` entities
    /// are suppressed while the walker is inside one of these, per the
    /// scope filter rule.
    pub function_scope_kinds: &'static [&'static str],
    /// Object-literal key-value node kind (JS/TS `pair`), if this
    /// language has one. Mapped to `method` when its value is
    /// function-like, else `property`, rather than through `entity_rules`
    /// since the mapping depends on the value, not just the node kind.
    pub pair_kind: Option<&'static str>,
}

impl std::fmt::Debug for LanguageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageConfig").field("id", &self.id).finish()
    }
}

/// Whether a pair's value node kind makes it a method rather than a
/// plain data property (`{ greet() {} }` vs. `{ name: "a" }`).
fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_expression" | "function" | "arrow_function" | "generator_function" | "generator_function_declaration"
    )
}

macro_rules! rules {
    ($(($kind:literal, $ty:ident)),* $(,)?) => {
        &[$(EntityRule { node_kind: $kind, entity_type: EntityType::$ty }),*]
    };
}

const RUST_RULES: &[EntityRule] = rules![
    ("function_item", Function),
    ("struct_item", Struct),
    ("enum_item", Enum),
    ("trait_item", Trait),
    ("impl_item", Impl),
    ("mod_item", Module),
    ("const_item", Constant),
    ("static_item", Static),
];

const PYTHON_RULES: &[EntityRule] = rules![
    ("function_definition", Function),
    ("class_definition", Class),
];

const JAVASCRIPT_RULES: &[EntityRule] = rules![
    ("function_declaration", Function),
    ("function_expression", Function),
    ("arrow_function", Function),
    ("method_definition", Method),
    ("class_declaration", Class),
    ("lexical_declaration", Variable),
    ("variable_declaration", Variable),
];

const TYPESCRIPT_RULES: &[EntityRule] = rules![
    ("function_declaration", Function),
    ("function_expression", Function),
    ("arrow_function", Function),
    ("method_definition", Method),
    ("class_declaration", Class),
    ("interface_declaration", Interface),
    ("type_alias_declaration", Type),
    ("enum_declaration", Enum),
    ("lexical_declaration", Variable),
];

const GO_RULES: &[EntityRule] = rules![
    ("function_declaration", Function),
    ("method_declaration", Method),
    ("type_declaration", Type),
    ("const_declaration", Constant),
    ("var_declaration", Variable),
];

const CPP_RULES: &[EntityRule] = rules![
    ("function_definition", Function),
    ("class_specifier", Class),
    ("struct_specifier", Struct),
    ("enum_specifier", Enum),
    ("namespace_definition", Module),
];

const C_RULES: &[EntityRule] = rules![
    ("function_definition", Function),
    ("struct_specifier", Struct),
    ("enum_specifier", Enum),
];

const JAVA_RULES: &[EntityRule] = rules![
    ("method_declaration", Method),
    ("constructor_declaration", Method),
    ("class_declaration", Class),
    ("interface_declaration", Interface),
    ("enum_declaration", Enum),
    ("field_declaration", Property),
];

const CSHARP_RULES: &[EntityRule] = rules![
    ("method_declaration", Method),
    ("constructor_declaration", Method),
    ("class_declaration", Class),
    ("interface_declaration", Interface),
    ("struct_declaration", Struct),
    ("enum_declaration", Enum),
    ("property_declaration", Property),
];

const RUBY_RULES: &[EntityRule] = rules![
    ("method", Method),
    ("singleton_method", Method),
    ("class", Class),
    ("module", Module),
];

const PHP_RULES: &[EntityRule] = rules![
    ("function_definition", Function),
    ("method_declaration", Method),
    ("class_declaration", Class),
    ("interface_declaration", Interface),
];

const FORTRAN_RULES: &[EntityRule] = rules![
    ("function", Function),
    ("subroutine", Function),
    ("module", Module),
    ("derived_type_definition", Type),
];

fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}
fn rust_language() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}
fn javascript_language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}
fn typescript_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}
fn tsx_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}
fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}
fn cpp_language() -> Language {
    tree_sitter_cpp::LANGUAGE.into()
}
fn c_language() -> Language {
    tree_sitter_c::LANGUAGE.into()
}
fn java_language() -> Language {
    tree_sitter_java::LANGUAGE.into()
}
fn csharp_language() -> Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}
fn ruby_language() -> Language {
    tree_sitter_ruby::LANGUAGE.into()
}
fn php_language() -> Language {
    tree_sitter_php::LANGUAGE_PHP.into()
}
fn fortran_language() -> Language {
    tree_sitter_fortran::LANGUAGE.into()
}

impl LanguageConfig {
    /// Every tree-sitter-backed language wired into the build.
    pub fn builtins() -> Vec<LanguageConfig> {
        vec![
            LanguageConfig {
                id: "python",
                extensions: &["py", "pyi"],
                grammar: python_language,
                entity_rules: PYTHON_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier"],
                transparent_wrapper_kinds: &["decorated_definition"],
                function_scope_kinds: &["function_definition"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "javascript",
                extensions: &["js", "jsx", "mjs", "cjs"],
                grammar: javascript_language,
                entity_rules: JAVASCRIPT_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "property_identifier"],
                transparent_wrapper_kinds: &["export_statement"],
                function_scope_kinds: &["function_declaration", "function_expression", "arrow_function", "method_definition"],
                pair_kind: Some("pair"),
            },
            LanguageConfig {
                id: "typescript",
                extensions: &["ts", "cts", "mts"],
                grammar: typescript_language,
                entity_rules: TYPESCRIPT_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "type_identifier", "property_identifier"],
                transparent_wrapper_kinds: &["export_statement"],
                function_scope_kinds: &["function_declaration", "function_expression", "arrow_function", "method_definition"],
                pair_kind: Some("pair"),
            },
            LanguageConfig {
                id: "tsx",
                extensions: &["tsx"],
                grammar: tsx_language,
                entity_rules: TYPESCRIPT_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "type_identifier", "property_identifier"],
                transparent_wrapper_kinds: &["export_statement"],
                function_scope_kinds: &["function_declaration", "function_expression", "arrow_function", "method_definition"],
                pair_kind: Some("pair"),
            },
            LanguageConfig {
                id: "rust",
                extensions: &["rs"],
                grammar: rust_language,
                entity_rules: RUST_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "type_identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function_item"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "go",
                extensions: &["go"],
                grammar: go_language,
                entity_rules: GO_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "field_identifier", "type_identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function_declaration", "method_declaration"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "cpp",
                extensions: &["cpp", "cxx", "cc", "hpp", "hxx", "hh"],
                grammar: cpp_language,
                entity_rules: CPP_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "field_identifier", "type_identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function_definition"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "c",
                extensions: &["c", "h"],
                grammar: c_language,
                entity_rules: C_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "type_identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function_definition"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "java",
                extensions: &["java"],
                grammar: java_language,
                entity_rules: JAVA_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["method_declaration", "constructor_declaration"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "csharp",
                extensions: &["cs"],
                grammar: csharp_language,
                entity_rules: CSHARP_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["method_declaration", "constructor_declaration"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "ruby",
                extensions: &["rb"],
                grammar: ruby_language,
                entity_rules: RUBY_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier", "constant"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["method", "singleton_method"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "php",
                extensions: &["php"],
                grammar: php_language,
                entity_rules: PHP_RULES,
                name_field: "name",
                name_fallback_kinds: &["name", "identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function_definition", "method_declaration"],
                pair_kind: None,
            },
            LanguageConfig {
                id: "fortran",
                extensions: &["f90", "f95", "f03", "f08"],
                grammar: fortran_language,
                entity_rules: FORTRAN_RULES,
                name_field: "name",
                name_fallback_kinds: &["identifier"],
                transparent_wrapper_kinds: &[],
                function_scope_kinds: &["function", "subroutine"],
                pair_kind: None,
            },
        ]
    }

    fn rule_for_kind(&self, kind: &str) -> Option<EntityType> {
        self.entity_rules
            .iter()
            .find(|rule| rule.node_kind == kind)
            .map(|rule| rule.entity_type)
    }
}

/// Process-wide cache of tree-sitter `Language` handles, keyed by plugin
/// id. Constructing a `Language` loads and validates the grammar's node
/// table; it is safe and cheap to share once built.
static GRAMMAR_CACHE: Lazy<RwLock<HashMap<&'static str, Language>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn cached_language(config: &LanguageConfig) -> Language {
    if let Some(lang) = GRAMMAR_CACHE.read().unwrap().get(config.id) {
        return lang.clone();
    }
    let lang = (config.grammar)();
    GRAMMAR_CACHE
        .write()
        .unwrap()
        .insert(config.id, lang.clone());
    lang
}

struct WalkContext {
    inside_function: bool,
    parent_id: Option<String>,
}

/// A single tree-sitter-backed plugin, parameterized entirely by
/// [`LanguageConfig`].
pub struct TreeSitterPlugin {
    config: LanguageConfig,
}

impl TreeSitterPlugin {
    pub fn new(config: LanguageConfig) -> Self {
        Self { config }
    }

    fn extract_name(&self, node: &Node, source: &str) -> Option<String> {
        if let Some(name_node) = node.child_by_field_name(self.config.name_field) {
            return node_text_normalized(&name_node, source).ok();
        }
        for kind in self.config.name_fallback_kinds {
            if let Some(child) = find_child_by_kind(node, kind) {
                if let Ok(text) = node_text_normalized(&child, source) {
                    return Some(text);
                }
            }
            if let Some(descendant) = find_descendant_by_kind(node, kind) {
                if let Ok(text) = node_text_normalized(&descendant, source) {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Extract an object-literal pair's key as an entity name, stripping
    /// the surrounding quotes from a string key (`"foo": ...` -> `foo`).
    /// A computed key (`[expr]: ...`) has no static name.
    fn pair_name(&self, key: &Node, source: &str) -> Option<String> {
        if key.kind() == "computed_property_name" {
            return None;
        }
        let text = node_text_normalized(key, source).ok()?;
        if key.kind() == "string" {
            Some(text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string())
        } else {
            Some(text)
        }
    }

    fn pair_to_entity(
        &self,
        node: Node,
        source: &str,
        file_path: &str,
        ctx: &WalkContext,
        anon_counter: &mut usize,
    ) -> Result<Option<Entity>> {
        let Some(value) = node.child_by_field_name("value") else {
            return Ok(None);
        };
        let entity_type = if is_function_like(value.kind()) {
            EntityType::Method
        } else {
            EntityType::Property
        };

        if entity_type == EntityType::Property && ctx.inside_function {
            return Ok(None);
        }

        let name = node
            .child_by_field_name("key")
            .and_then(|key| self.pair_name(&key, source))
            .unwrap_or_else(|| {
                *anon_counter += 1;
                format!("anonymous_{}_{}", entity_type.label(), anon_counter)
            });

        self.build_entity(node, entity_type, name, source, file_path, ctx).map(Some)
    }

    fn node_to_entity(
        &self,
        node: Node,
        source: &str,
        file_path: &str,
        ctx: &WalkContext,
        anon_counter: &mut usize,
    ) -> Result<Option<Entity>> {
        if self.config.pair_kind == Some(node.kind()) {
            return self.pair_to_entity(node, source, file_path, ctx, anon_counter);
        }

        let Some(entity_type) = self.config.rule_for_kind(node.kind()) else {
            return Ok(None);
        };

        if entity_type == EntityType::Variable && ctx.inside_function {
            return Ok(None);
        }

        let name = self.extract_name(&node, source).unwrap_or_else(|| {
            *anon_counter += 1;
            format!("anonymous_{}_{}", entity_type.label(), anon_counter)
        });

        self.build_entity(node, entity_type, name, source, file_path, ctx).map(Some)
    }

    fn build_entity(
        &self,
        node: Node,
        entity_type: EntityType,
        name: String,
        source: &str,
        file_path: &str,
        ctx: &WalkContext,
    ) -> Result<Entity> {
        let content = node
            .utf8_text(source.as_bytes())
            .map_err(|e| SemError::parse_with_path(self.config.id.to_string(), e.to_string(), file_path.to_string()))?
            .to_string();
        let normalized = node_text_normalized(&node, source)?;
        let content_hash = Entity::hash_normalized(&normalized);

        let id = Entity::build_id(file_path, entity_type, &name, ctx.parent_id.as_deref());

        Ok(Entity {
            id,
            file_path: file_path.to_string(),
            entity_type,
            name,
            parent_id: ctx.parent_id.clone(),
            content,
            content_hash,
            start_line: to_line_number(node.start_position().row),
            end_line: to_line_number(node.end_position().row),
            metadata: Default::default(),
        })
    }

    fn walk(
        &self,
        node: Node,
        source: &str,
        file_path: &str,
        ctx: WalkContext,
        out: &mut Vec<Entity>,
        anon_counter: &mut usize,
    ) -> Result<()> {
        let is_wrapper = self.config.transparent_wrapper_kinds.contains(&node.kind());

        let next_ctx = if is_wrapper {
            None
        } else {
            self.node_to_entity(node, source, file_path, &ctx, anon_counter)?
        };

        let child_ctx = match next_ctx {
            Some(entity) => {
                let inside_function =
                    ctx.inside_function || self.config.function_scope_kinds.contains(&node.kind());
                let parent_id = Some(entity.id.clone());
                out.push(entity);
                WalkContext {
                    inside_function,
                    parent_id,
                }
            }
            None => WalkContext {
                inside_function: ctx.inside_function
                    || self.config.function_scope_kinds.contains(&node.kind()),
                parent_id: ctx.parent_id.clone(),
            },
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let child_ctx = WalkContext {
                inside_function: child_ctx.inside_function,
                parent_id: child_ctx.parent_id.clone(),
            };
            self.walk(child, source, file_path, child_ctx, out, anon_counter)?;
        }

        Ok(())
    }
}

impl EntityPlugin for TreeSitterPlugin {
    fn id(&self) -> &str {
        self.config.id
    }

    fn extensions(&self) -> &[&str] {
        self.config.extensions
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        let language = cached_language(&self.config);
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| SemError::parse(self.config.id.to_string(), e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| SemError::parse_with_path(self.config.id.to_string(), "failed to parse source", file_path.to_string()))?;

        let mut entities = Vec::new();
        let mut anon_counter = 0usize;
        let ctx = WalkContext {
            inside_function: false,
            parent_id: None,
        };
        self.walk(tree.root_node(), source, file_path, ctx, &mut entities, &mut anon_counter)?;
        Ok(entities)
    }
}
