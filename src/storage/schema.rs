//! SQLite schema and pragma setup for the embedded store.

use rusqlite::Connection;

use crate::core::config::StoreConfig;
use crate::core::errors::Result;

const CREATE_ENTITIES: &str = "
CREATE TABLE IF NOT EXISTS entities (
    id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    name TEXT NOT NULL,
    parent_id TEXT,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    commit_sha TEXT,
    snapshot TEXT NOT NULL DEFAULT 'current',
    PRIMARY KEY (id, snapshot)
);
";

const CREATE_ENTITY_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_entities_file_path ON entities(file_path);
CREATE INDEX IF NOT EXISTS idx_entities_entity_type ON entities(entity_type);
CREATE INDEX IF NOT EXISTS idx_entities_snapshot ON entities(snapshot);
CREATE INDEX IF NOT EXISTS idx_entities_content_hash ON entities(content_hash);
";

const CREATE_CHANGES: &str = "
CREATE TABLE IF NOT EXISTS changes (
    id TEXT PRIMARY KEY,
    entity_id TEXT NOT NULL,
    change_type TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    old_file_path TEXT,
    before_content TEXT,
    after_content TEXT,
    commit_sha TEXT,
    author TEXT,
    timestamp INTEGER
);
";

const CREATE_CHANGE_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_changes_file_path ON changes(file_path);
CREATE INDEX IF NOT EXISTS idx_changes_change_type ON changes(change_type);
CREATE INDEX IF NOT EXISTS idx_changes_entity_type ON changes(entity_type);
CREATE INDEX IF NOT EXISTS idx_changes_commit_sha ON changes(commit_sha);
";

const CREATE_METADATA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Apply pragmas and create tables/indexes if they do not already exist.
pub fn init(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.pragma_update(None, "journal_mode", &config.journal_mode)?;
    conn.pragma_update(None, "synchronous", &config.synchronous)?;

    conn.execute_batch(CREATE_ENTITIES)?;
    conn.execute_batch(CREATE_ENTITY_INDEXES)?;
    conn.execute_batch(CREATE_CHANGES)?;
    conn.execute_batch(CREATE_CHANGE_INDEXES)?;
    conn.execute_batch(CREATE_METADATA)?;

    Ok(())
}
