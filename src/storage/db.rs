//! Embedded-SQL store: a `Store` trait plus a single `rusqlite`-backed
//! implementation, grounded on the `Storage` trait / `pub mod sqlite` split
//! used by `other_examples`' beads storage layer.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::change::{ChangeType, SemanticChange};
use crate::core::config::StoreConfig;
use crate::core::entity::{Entity, EntityType};
use crate::core::errors::{Result, SemError};

use super::schema;

/// Filter for `get_entities`.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub snapshot: Option<String>,
    pub file_path: Option<String>,
}

/// Filter for `get_changes`.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub file_path: Option<String>,
    pub change_type: Option<ChangeType>,
    pub entity_type: Option<EntityType>,
    pub commit_sha: Option<String>,
    pub limit: Option<usize>,
}

/// Single-writer embedded store, per spec §4.5.
pub trait Store: Send + Sync {
    /// Transactional batch upsert, all-or-nothing per call.
    fn upsert_entities(&self, entities: &[Entity], snapshot: &str, commit_sha: Option<&str>) -> Result<()>;

    /// Transactional batch upsert, all-or-nothing per call.
    fn upsert_changes(&self, changes: &[SemanticChange]) -> Result<()>;

    fn get_entities(&self, filter: &EntityFilter) -> Result<Vec<Entity>>;

    fn get_changes(&self, filter: &ChangeFilter) -> Result<Vec<SemanticChange>>;

    /// Run an arbitrary read-only `SELECT`, returning row maps.
    fn query(&self, sql: &str) -> Result<Vec<HashMap<String, String>>>;

    fn set_metadata(&self, key: &str, value: &str) -> Result<()>;

    fn get_metadata(&self, key: &str) -> Result<Option<String>>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if absent) the store at `path`, applying pragmas and
    /// schema from `config`.
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::init(&conn, config)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory store, used by tests and short-lived CLI queries.
    pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn, config)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn entity_type_to_str(t: EntityType) -> &'static str {
    t.label()
}

fn entity_type_from_str(s: &str) -> Result<EntityType> {
    use EntityType::*;
    Ok(match s {
        "function" => Function,
        "method" => Method,
        "class" => Class,
        "interface" => Interface,
        "type" => Type,
        "enum" => Enum,
        "struct" => Struct,
        "impl" => Impl,
        "trait" => Trait,
        "module" => Module,
        "constant" => Constant,
        "static" => Static,
        "variable" => Variable,
        "property" => Property,
        "section" => Section,
        "element" => Element,
        "row" => Row,
        "heading" => Heading,
        "preamble" => Preamble,
        "chunk" => Chunk,
        "export" => Export,
        other => return Err(SemError::internal(format!("unknown entity_type in store: {other}"))),
    })
}

fn change_type_to_str(t: ChangeType) -> &'static str {
    match t {
        ChangeType::Added => "added",
        ChangeType::Modified => "modified",
        ChangeType::Deleted => "deleted",
        ChangeType::Moved => "moved",
        ChangeType::Renamed => "renamed",
    }
}

fn change_type_from_str(s: &str) -> Result<ChangeType> {
    Ok(match s {
        "added" => ChangeType::Added,
        "modified" => ChangeType::Modified,
        "deleted" => ChangeType::Deleted,
        "moved" => ChangeType::Moved,
        "renamed" => ChangeType::Renamed,
        other => return Err(SemError::internal(format!("unknown change_type in store: {other}"))),
    })
}

impl Store for SqliteStore {
    fn upsert_entities(&self, entities: &[Entity], snapshot: &str, commit_sha: Option<&str>) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entities
                 (id, file_path, entity_type, name, parent_id, content, content_hash,
                  start_line, end_line, commit_sha, snapshot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id, snapshot) DO UPDATE SET
                   file_path=excluded.file_path, entity_type=excluded.entity_type,
                   name=excluded.name, parent_id=excluded.parent_id, content=excluded.content,
                   content_hash=excluded.content_hash, start_line=excluded.start_line,
                   end_line=excluded.end_line, commit_sha=excluded.commit_sha",
            )?;
            for entity in entities {
                stmt.execute(params![
                    entity.id,
                    entity.file_path,
                    entity_type_to_str(entity.entity_type),
                    entity.name,
                    entity.parent_id,
                    entity.content,
                    entity.content_hash,
                    entity.start_line as i64,
                    entity.end_line as i64,
                    commit_sha,
                    snapshot,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_changes(&self, changes: &[SemanticChange]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO changes
                 (id, entity_id, change_type, entity_type, entity_name, file_path, old_file_path,
                  before_content, after_content, commit_sha, author, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                   entity_id=excluded.entity_id, change_type=excluded.change_type,
                   entity_type=excluded.entity_type, entity_name=excluded.entity_name,
                   file_path=excluded.file_path, old_file_path=excluded.old_file_path,
                   before_content=excluded.before_content, after_content=excluded.after_content,
                   commit_sha=excluded.commit_sha, author=excluded.author, timestamp=excluded.timestamp",
            )?;
            for change in changes {
                stmt.execute(params![
                    change.id,
                    change.entity_id,
                    change_type_to_str(change.change_type),
                    entity_type_to_str(change.entity_type),
                    change.entity_name,
                    change.file_path,
                    change.old_file_path,
                    change.before_content,
                    change.after_content,
                    change.commit_sha,
                    change.author,
                    change.timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_entities(&self, filter: &EntityFilter) -> Result<Vec<Entity>> {
        let conn = self.conn.lock();
        let snapshot = filter.snapshot.as_deref().unwrap_or("current");

        let mut sql = String::from(
            "SELECT id, file_path, entity_type, name, parent_id, content, content_hash,
                    start_line, end_line
             FROM entities WHERE snapshot = ?1",
        );
        if filter.file_path.is_some() {
            sql.push_str(" AND file_path = ?2");
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = if let Some(file_path) = &filter.file_path {
            stmt.query_map(params![snapshot, file_path], row_to_entity)?
        } else {
            stmt.query_map(params![snapshot], row_to_entity)?
        };

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }

    fn get_changes(&self, filter: &ChangeFilter) -> Result<Vec<SemanticChange>> {
        let conn = self.conn.lock();

        let mut sql = String::from(
            "SELECT id, entity_id, change_type, entity_type, entity_name, file_path,
                    old_file_path, before_content, after_content, commit_sha, author, timestamp
             FROM changes WHERE 1=1",
        );
        if filter.file_path.is_some() {
            sql.push_str(" AND file_path = ?");
        }
        if filter.change_type.is_some() {
            sql.push_str(" AND change_type = ?");
        }
        if filter.entity_type.is_some() {
            sql.push_str(" AND entity_type = ?");
        }
        if filter.commit_sha.is_some() {
            sql.push_str(" AND commit_sha = ?");
        }
        sql.push_str(" ORDER BY rowid DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut index = 1;
        if let Some(file_path) = &filter.file_path {
            stmt.raw_bind_parameter(index, file_path)?;
            index += 1;
        }
        if let Some(change_type) = filter.change_type {
            stmt.raw_bind_parameter(index, change_type_to_str(change_type))?;
            index += 1;
        }
        if let Some(entity_type) = filter.entity_type {
            stmt.raw_bind_parameter(index, entity_type_to_str(entity_type))?;
            index += 1;
        }
        if let Some(commit_sha) = &filter.commit_sha {
            stmt.raw_bind_parameter(index, commit_sha)?;
        }

        let mut rows = stmt.raw_query();
        let mut changes = Vec::new();
        while let Some(row) = rows.next()? {
            changes.push(row_to_change(row)?);
        }
        Ok(changes)
    }

    fn query(&self, sql: &str) -> Result<Vec<HashMap<String, String>>> {
        let trimmed = sql.trim_start().to_ascii_lowercase();
        if !trimmed.starts_with("select") {
            return Err(SemError::invalid_query("only SELECT statements are permitted"));
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SemError::invalid_query(e.to_string()))?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map([], |row| {
                let mut map = HashMap::new();
                for (index, name) in column_names.iter().enumerate() {
                    let value: rusqlite::types::Value = row.get(index)?;
                    let text = match value {
                        rusqlite::types::Value::Null => String::new(),
                        rusqlite::types::Value::Integer(i) => i.to_string(),
                        rusqlite::types::Value::Real(f) => f.to_string(),
                        rusqlite::types::Value::Text(s) => s,
                        rusqlite::types::Value::Blob(_) => "<blob>".to_string(),
                    };
                    map.insert(name.clone(), text);
                }
                Ok(map)
            })
            .map_err(|e| SemError::invalid_query(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| SemError::invalid_query(e.to_string()))?);
        }
        Ok(out)
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }
}

fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
    let entity_type_str: String = row.get(2)?;
    let entity_type = entity_type_from_str(&entity_type_str)
        .map_err(|e| rusqlite::Error::InvalidColumnName(e.to_string()))?;
    Ok(Entity {
        id: row.get(0)?,
        file_path: row.get(1)?,
        entity_type,
        name: row.get(3)?,
        parent_id: row.get(4)?,
        content: row.get(5)?,
        content_hash: row.get(6)?,
        start_line: row.get::<_, i64>(7)? as usize,
        end_line: row.get::<_, i64>(8)? as usize,
        metadata: HashMap::new(),
    })
}

fn row_to_change(row: &rusqlite::Row<'_>) -> Result<SemanticChange> {
    let change_type_str: String = row.get(2)?;
    let entity_type_str: String = row.get(3)?;
    Ok(SemanticChange {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        change_type: change_type_from_str(&change_type_str)?,
        entity_type: entity_type_from_str(&entity_type_str)?,
        entity_name: row.get(4)?,
        file_path: row.get(5)?,
        old_file_path: row.get(6)?,
        before_content: row.get(7)?,
        after_content: row.get(8)?,
        commit_sha: row.get(9)?,
        author: row.get(10)?,
        timestamp: row.get(11)?,
        similarity: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::content_hash;

    fn sample_entity(file_path: &str, name: &str) -> Entity {
        Entity {
            id: Entity::build_id(file_path, EntityType::Function, name, None),
            file_path: file_path.to_string(),
            entity_type: EntityType::Function,
            name: name.to_string(),
            parent_id: None,
            content: "fn foo() {}".to_string(),
            content_hash: content_hash("fn foo() {}"),
            start_line: 1,
            end_line: 1,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn round_trips_entities_through_the_store() {
        let store = SqliteStore::open_in_memory(&StoreConfig::default()).unwrap();
        let entity = sample_entity("a.rs", "foo");
        store.upsert_entities(&[entity.clone()], "current", None).unwrap();

        let recovered = store.get_entities(&EntityFilter::default()).unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].id, entity.id);
        assert_eq!(recovered[0].content_hash, entity.content_hash);
    }

    #[test]
    fn filters_entities_by_file_path() {
        let store = SqliteStore::open_in_memory(&StoreConfig::default()).unwrap();
        store
            .upsert_entities(&[sample_entity("a.rs", "foo"), sample_entity("b.rs", "bar")], "current", None)
            .unwrap();

        let filtered = store
            .get_entities(&EntityFilter {
                snapshot: None,
                file_path: Some("b.rs".to_string()),
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].file_path, "b.rs");
    }

    #[test]
    fn metadata_round_trips() {
        let store = SqliteStore::open_in_memory(&StoreConfig::default()).unwrap();
        assert_eq!(store.get_metadata("schema_version").unwrap(), None);
        store.set_metadata("schema_version", "1").unwrap();
        assert_eq!(store.get_metadata("schema_version").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn query_rejects_non_select_statements() {
        let store = SqliteStore::open_in_memory(&StoreConfig::default()).unwrap();
        assert!(store.query("DELETE FROM entities").is_err());
        assert!(store.query("SELECT 1 as one").is_ok());
    }
}
