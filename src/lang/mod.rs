//! Pluggable entity extraction: one plugin per language or data format,
//! dispatched by file extension through the [`registry::ParserRegistry`].

pub mod fallback;
pub mod formats;
pub mod json;
pub mod plugin;
pub mod registry;
pub mod treesitter;

pub use plugin::EntityPlugin;
pub use registry::{ParserRegistry, PluginInfo};
