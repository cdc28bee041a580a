use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("duplicate entry id: {0}")]
    DuplicateId(String),
    #[error("malformed ledger row for {0}: {1}")]
    MalformedRow(String, String),
}

/// One vaulted file. Immutable after creation apart from the tombstone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultEntry {
    pub uuid: String,
    pub original_path: PathBuf,
    pub ciphertext_path: PathBuf,
    pub owner: String,
    pub policy: String,
    pub content_hash: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Snapshot aggregates over non-tombstoned entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerStats {
    pub total_entries: u64,
    pub total_bytes: u64,
    pub per_owner: BTreeMap<String, u64>,
}

/// Durable, uuid-keyed record of vault entries. Append-only except for
/// tombstones; WAL mode keeps the file readable across a crash, and a row is
/// either fully present or absent.
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS vault_entries (
                uuid TEXT PRIMARY KEY,
                orig_path TEXT NOT NULL,
                enc_path TEXT NOT NULL,
                owner TEXT NOT NULL,
                policy TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                deleted_at TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_vault_owner ON vault_entries(owner)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new entry. The primary key enforces uuid uniqueness; a lost
    /// race surfaces as `DuplicateId` so the caller can retry with a new id.
    pub fn insert(&self, entry: &VaultEntry) -> Result<(), LedgerError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO vault_entries
                (uuid, orig_path, enc_path, owner, policy, content_hash, size_bytes, created_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
            params![
                entry.uuid,
                entry.original_path.to_string_lossy().into_owned(),
                entry.ciphertext_path.to_string_lossy().into_owned(),
                entry.owner,
                entry.policy,
                entry.content_hash,
                entry.size_bytes as i64,
                entry.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::DuplicateId(entry.uuid.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, uuid: &str) -> Result<bool, LedgerError> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM vault_entries WHERE uuid = ?1",
                params![uuid],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, uuid: &str) -> Result<Option<VaultEntry>, LedgerError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT uuid, orig_path, enc_path, owner, policy, content_hash,
                        size_bytes, created_at, deleted_at
                 FROM vault_entries WHERE uuid = ?1",
                params![uuid],
                row_to_raw,
            )
            .optional()?;
        raw.map(raw_to_entry).transpose()
    }

    /// All non-tombstoned entries, oldest first.
    pub fn entries(&self) -> Result<Vec<VaultEntry>, LedgerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT uuid, orig_path, enc_path, owner, policy, content_hash,
                    size_bytes, created_at, deleted_at
             FROM vault_entries WHERE deleted_at IS NULL ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], row_to_raw)?;

        let mut entries = Vec::new();
        for raw in rows {
            entries.push(raw_to_entry(raw?)?);
        }
        Ok(entries)
    }

    /// Mark an entry deleted. Returns false when the entry is absent or
    /// already tombstoned.
    pub fn tombstone(&self, uuid: &str, when: DateTime<Utc>) -> Result<bool, LedgerError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE vault_entries SET deleted_at = ?1 WHERE uuid = ?2 AND deleted_at IS NULL",
            params![when.to_rfc3339(), uuid],
        )?;
        Ok(changed > 0)
    }

    pub fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let conn = self.conn.lock();
        let (total_entries, total_bytes): (i64, Option<i64>) = conn.query_row(
            "SELECT COUNT(*), SUM(size_bytes) FROM vault_entries WHERE deleted_at IS NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut per_owner = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT owner, COUNT(*) FROM vault_entries WHERE deleted_at IS NULL GROUP BY owner",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (owner, count) = row?;
            per_owner.insert(owner, count as u64);
        }

        Ok(LedgerStats {
            total_entries: total_entries as u64,
            total_bytes: total_bytes.unwrap_or(0) as u64,
            per_owner,
        })
    }
}

type RawRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
);

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn raw_to_entry(raw: RawRow) -> Result<VaultEntry, LedgerError> {
    let (uuid, orig_path, enc_path, owner, policy, content_hash, size_bytes, created_at, deleted_at) =
        raw;

    let parse = |value: &str| -> Result<DateTime<Utc>, LedgerError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| LedgerError::MalformedRow(uuid.clone(), e.to_string()))
    };

    let created_at = parse(&created_at)?;
    let deleted_at = deleted_at.as_deref().map(parse).transpose()?;

    Ok(VaultEntry {
        uuid,
        original_path: PathBuf::from(orig_path),
        ciphertext_path: PathBuf::from(enc_path),
        owner,
        policy,
        content_hash,
        size_bytes: size_bytes as u64,
        created_at,
        deleted_at,
    })
}
