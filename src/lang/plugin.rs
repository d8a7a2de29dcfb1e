//! The extraction-plugin trait implemented by every language/format adapter.

use crate::core::entity::Entity;
use crate::core::errors::Result;

/// A pluggable entity extractor for one language or data format.
///
/// Implementors are stateless with respect to source text: [`extract`]
/// takes the full file content and file path and returns every entity it
/// can identify, in file order. Plugins never touch the matcher, the
/// orchestrator, or the store — they only turn text into [`Entity`] values.
///
/// [`extract`]: EntityPlugin::extract
pub trait EntityPlugin: Send + Sync {
    /// Stable plugin id, e.g. `"python"`, `"json"`, `"markdown"`.
    fn id(&self) -> &str;

    /// Lower-case file extensions this plugin claims, without the leading
    /// dot (e.g. `["py", "pyi"]`).
    fn extensions(&self) -> &[&str];

    /// Extract every entity from `source`, tagging each with `file_path`.
    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Entity>>;
}
