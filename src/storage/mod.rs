//! Embedded-SQL storage and query layer, plus the blame/history algorithms
//! built on top of it.

pub mod blame;
pub mod db;
pub mod history;
pub mod schema;

pub use blame::{blame_file, BlameEntry};
pub use db::{ChangeFilter, EntityFilter, SqliteStore, Store};
pub use history::{entity_history, HistoryTransition};
