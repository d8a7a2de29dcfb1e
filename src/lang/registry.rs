//! Dispatch table mapping file extensions to extraction plugins.

use std::collections::HashMap;

use crate::core::entity::Entity;
use crate::core::errors::Result;

use super::fallback::FallbackPlugin;
use super::formats::{csv::CsvPlugin, markdown::MarkdownPlugin, toml::TomlPlugin, yaml::YamlPlugin};
use super::json::JsonPlugin;
use super::plugin::EntityPlugin;
use super::treesitter::{LanguageConfig, TreeSitterPlugin};

/// Metadata describing one registered plugin, for the `languages` CLI
/// subcommand and diagnostics.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub id: String,
    pub extensions: Vec<String>,
}

/// Extension -> plugin dispatch table. Built once and shared across an
/// entire diff run; individual plugin implementations hold no per-file
/// state, so sharing via `&ParserRegistry` across the orchestrator's
/// worker pool is safe.
pub struct ParserRegistry {
    by_extension: HashMap<String, usize>,
    plugins: Vec<Box<dyn EntityPlugin>>,
    fallback: FallbackPlugin,
}

impl ParserRegistry {
    /// Build the registry with every built-in plugin registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            by_extension: HashMap::new(),
            plugins: Vec::new(),
            fallback: FallbackPlugin::new(),
        };

        for config in LanguageConfig::builtins() {
            registry.register(Box::new(TreeSitterPlugin::new(config)));
        }

        registry.register(Box::new(JsonPlugin::new()));
        registry.register(Box::new(YamlPlugin::new()));
        registry.register(Box::new(TomlPlugin::new()));
        registry.register(Box::new(CsvPlugin::new()));
        registry.register(Box::new(MarkdownPlugin::new()));

        registry
    }

    /// Register a plugin, indexing it by every extension it claims.
    /// A later registration for the same extension overrides an earlier
    /// one; built-ins are registered in a fixed order so this never
    /// happens in `with_builtins`.
    pub fn register(&mut self, plugin: Box<dyn EntityPlugin>) {
        let index = self.plugins.len();
        for ext in plugin.extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), index);
        }
        self.plugins.push(plugin);
    }

    /// Look up the plugin registered for a file's extension, if any.
    pub fn plugin_for_path(&self, file_path: &str) -> Option<&dyn EntityPlugin> {
        let ext = std::path::Path::new(file_path)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();
        self.by_extension
            .get(&ext)
            .map(|&i| self.plugins[i].as_ref())
    }

    /// Extract entities from `source`, dispatching on `file_path`'s
    /// extension and falling back to the line-chunk plugin when no
    /// specific plugin claims the extension.
    pub fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>> {
        match self.plugin_for_path(file_path) {
            Some(plugin) => plugin.extract(source, file_path),
            None => self.fallback.extract(source, file_path),
        }
    }

    /// List every registered plugin plus the always-available fallback,
    /// for the `sem languages` CLI subcommand.
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self
            .plugins
            .iter()
            .map(|p| PluginInfo {
                id: p.id().to_string(),
                extensions: p.extensions().iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        infos.push(PluginInfo {
            id: self.fallback.id().to_string(),
            extensions: vec!["*".to_string()],
        });
        infos
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_rust_files_to_treesitter_plugin() {
        let registry = ParserRegistry::with_builtins();
        let plugin = registry.plugin_for_path("src/lib.rs").unwrap();
        assert_eq!(plugin.id(), "rust");
    }

    #[test]
    fn dispatches_json_files_to_json_plugin() {
        let registry = ParserRegistry::with_builtins();
        let plugin = registry.plugin_for_path("package.json").unwrap();
        assert_eq!(plugin.id(), "json");
    }

    #[test]
    fn unknown_extension_falls_back() {
        let registry = ParserRegistry::with_builtins();
        assert!(registry.plugin_for_path("README.xyz").is_none());
        let entities = registry.extract("a\nb\nc\n", "README.xyz").unwrap();
        assert!(!entities.is_empty());
    }

    #[test]
    fn list_plugins_includes_fallback() {
        let registry = ParserRegistry::with_builtins();
        let infos = registry.list_plugins();
        assert!(infos.iter().any(|i| i.id == "fallback"));
        assert!(infos.iter().any(|i| i.id == "python"));
    }
}
