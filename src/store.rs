use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::game_log::{GameKey, SeasonType, StoredRecord};

/// One logical append-mostly partition per entity, created lazily, plus a
/// profile row per entity. Cross-entity joins are not expressible here by
/// design; they happen upstream, before records reach the store.
pub trait PartitionedStore {
    /// Idempotent: creating a partition that already exists is a no-op.
    fn ensure_partition(&mut self, entity_id: &str) -> Result<()>;

    /// Natural keys already persisted for the entity. An entity whose
    /// partition does not exist yet simply has no keys.
    fn list_keys(&self, entity_id: &str) -> Result<HashSet<GameKey>>;

    /// Append a batch atomically; existing rows are never touched. Returns
    /// the number of rows written.
    fn append_records(&mut self, entity_id: &str, records: &[StoredRecord]) -> Result<usize>;

    /// Create-or-update the entity's profile. Profiles are never deleted.
    fn upsert_profile(&mut self, entity_id: &str, profile: &Value) -> Result<()>;

    fn profile_ids(&self) -> Result<Vec<String>>;
}

/// SQLite-backed store. The partition table name is a pure function of
/// (namespace, entity id), so no registry of created partitions is needed
/// anywhere.
pub struct SqliteStore {
    conn: Connection,
    namespace: String,
}

impl SqliteStore {
    pub fn open(path: &Path, namespace: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::with_connection(conn, namespace)
    }

    pub fn in_memory(namespace: &str) -> Result<Self> {
        Self::with_connection(
            Connection::open_in_memory().context("open in-memory sqlite db")?,
            namespace,
        )
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self> {
        let namespace = sanitize_identifier(namespace);
        if namespace.is_empty() {
            return Err(anyhow!("store namespace must contain word characters"));
        }
        let store = Self { conn, namespace };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!(
                r#"
                PRAGMA journal_mode = WAL;
                CREATE TABLE IF NOT EXISTS {profiles} (
                    entity_id TEXT PRIMARY KEY,
                    profile TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
                profiles = self.profiles_table(),
            ))
            .context("create store schema")?;
        Ok(())
    }

    fn profiles_table(&self) -> String {
        format!("{}_profiles", self.namespace)
    }

    pub fn partition_table(&self, entity_id: &str) -> String {
        format!("{}_{}_game_logs", self.namespace, sanitize_identifier(entity_id))
    }

    /// Everything persisted for one entity, in chronological order. Not
    /// part of the sync contract; this is the query side.
    pub fn load_records(&self, entity_id: &str) -> Result<Vec<StoredRecord>> {
        let table = self.partition_table(entity_id);
        if !self.partition_exists(&table)? {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT season, week, season_type, opponent, payload
                 FROM {table} ORDER BY season, week, season_type"
            ))
            .context("prepare record listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("list partition records")?;

        let mut out = Vec::new();
        for row in rows {
            let (season, week, season_type, opponent, payload) =
                row.context("decode record row")?;
            let season_type = SeasonType::parse(&season_type)
                .ok_or_else(|| anyhow!("bad season_type {season_type:?} in {table}"))?;
            out.push(StoredRecord {
                key: GameKey {
                    season,
                    week,
                    season_type,
                    opponent: if opponent.is_empty() {
                        None
                    } else {
                        Some(opponent)
                    },
                },
                payload: serde_json::from_str(&payload)
                    .with_context(|| format!("bad payload json in {table}"))?,
            });
        }
        Ok(out)
    }

    fn partition_exists(&self, table: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()
            .context("probe partition table")?;
        Ok(found.is_some())
    }
}

impl PartitionedStore for SqliteStore {
    fn ensure_partition(&mut self, entity_id: &str) -> Result<()> {
        let table = self.partition_table(entity_id);
        self.conn
            .execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    entity_id TEXT NOT NULL,
                    season INTEGER NOT NULL,
                    week INTEGER NOT NULL,
                    season_type TEXT NOT NULL,
                    opponent TEXT NOT NULL DEFAULT '',
                    payload TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (season, week, season_type, opponent)
                );
                "#,
            ))
            .with_context(|| format!("create partition for entity {entity_id}"))?;
        Ok(())
    }

    fn list_keys(&self, entity_id: &str) -> Result<HashSet<GameKey>> {
        let table = self.partition_table(entity_id);
        if !self.partition_exists(&table)? {
            return Ok(HashSet::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT season, week, season_type, opponent FROM {table}"
            ))
            .context("prepare key listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("list partition keys")?;

        let mut keys = HashSet::new();
        for row in rows {
            let (season, week, season_type, opponent) = row.context("decode key row")?;
            let season_type = SeasonType::parse(&season_type)
                .ok_or_else(|| anyhow!("bad season_type {season_type:?} in {table}"))?;
            keys.insert(GameKey {
                season,
                week,
                season_type,
                opponent: if opponent.is_empty() {
                    None
                } else {
                    Some(opponent)
                },
            });
        }
        Ok(keys)
    }

    fn append_records(&mut self, entity_id: &str, records: &[StoredRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let table = self.partition_table(entity_id);
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction().context("begin append transaction")?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table}
                        (entity_id, season, week, season_type, opponent, payload, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ))
                .context("prepare append statement")?;
            for record in records {
                let payload = serde_json::to_string(&record.payload)
                    .context("serialize record payload")?;
                stmt.execute(params![
                    entity_id,
                    record.key.season,
                    record.key.week,
                    record.key.season_type.as_str(),
                    record.key.opponent.as_deref().unwrap_or(""),
                    payload,
                    now,
                ])
                .with_context(|| {
                    format!(
                        "append record {} w{} {} for entity {entity_id}",
                        record.key.season,
                        record.key.week,
                        record.key.season_type
                    )
                })?;
            }
        }
        tx.commit().context("commit append transaction")?;
        debug!("appended {} records to {table}", records.len());
        Ok(records.len())
    }

    fn upsert_profile(&mut self, entity_id: &str, profile: &Value) -> Result<()> {
        let json = serde_json::to_string(profile).context("serialize profile")?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {profiles} (entity_id, profile, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(entity_id) DO UPDATE SET
                        profile = excluded.profile,
                        updated_at = excluded.updated_at",
                    profiles = self.profiles_table(),
                ),
                params![entity_id, json, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("upsert profile for entity {entity_id}"))?;
        Ok(())
    }

    fn profile_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT entity_id FROM {profiles} ORDER BY entity_id",
                profiles = self.profiles_table(),
            ))
            .context("prepare profile listing")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("list profiles")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode profile id")?);
        }
        Ok(out)
    }
}

/// Deterministic mapping from an arbitrary entity id to a safe SQL
/// identifier fragment: word characters pass through, everything else
/// becomes an underscore.
fn sanitize_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_names_are_deterministic_and_safe() {
        let store = SqliteStore::in_memory("player").unwrap();
        assert_eq!(
            store.partition_table("00-0034796"),
            "player_00_0034796_game_logs"
        );
        assert_eq!(store.partition_table("ATL"), "player_ATL_game_logs");
        // Hostile ids cannot break out of the identifier position.
        let name = store.partition_table("x; DROP TABLE t--");
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn ensure_partition_is_idempotent() {
        let mut store = SqliteStore::in_memory("team").unwrap();
        store.ensure_partition("ATL").unwrap();
        store.ensure_partition("ATL").unwrap();
        assert!(store.list_keys("ATL").unwrap().is_empty());
    }

    #[test]
    fn listing_keys_of_a_missing_partition_is_empty_not_an_error() {
        let store = SqliteStore::in_memory("team").unwrap();
        assert!(store.list_keys("NOPE").unwrap().is_empty());
    }
}
