use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{ConsolidationRunRecord, MarkingRecord, MarkingState, ScanRunRecord};
use crate::model::{Marking, NodeId};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed project database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Reading and writing markings and run history.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace the marking for a node.
    pub fn set_marking(&self, node_id: &str, marking: Marking, updated_at: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO markings (node_id, is_ignored, is_marked_for_swap, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(node_id) DO UPDATE SET
                is_ignored = excluded.is_ignored,
                is_marked_for_swap = excluded.is_marked_for_swap,
                updated_at = excluded.updated_at
            "#,
            params![node_id, marking.is_ignored, marking.is_marked_for_swap, updated_at],
        )?;
        Ok(())
    }

    /// Remove a node's marking. Returns whether a row was deleted.
    pub fn clear_marking(&self, node_id: &str) -> DbResult<bool> {
        let affected = self.conn.execute("DELETE FROM markings WHERE node_id = ?1", params![node_id])?;
        Ok(affected > 0)
    }

    pub fn get_marking(&self, node_id: &str) -> DbResult<Option<Marking>> {
        let marking = self
            .conn
            .query_row(
                "SELECT is_ignored, is_marked_for_swap FROM markings WHERE node_id = ?1",
                params![node_id],
                |row| Ok(Marking { is_ignored: row.get(0)?, is_marked_for_swap: row.get(1)? }),
            )
            .optional()?;
        Ok(marking)
    }

    /// List all markings (ordered by node id).
    pub fn list_markings(&self) -> DbResult<Vec<MarkingRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT node_id, is_ignored, is_marked_for_swap, updated_at
            FROM markings
            ORDER BY node_id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MarkingRecord {
                node_id: row.get(0)?,
                is_ignored: row.get(1)?,
                is_marked_for_swap: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Ignored ids and the marking map, shaped for a scan session.
    pub fn load_marking_state(&self) -> DbResult<MarkingState> {
        let mut state = MarkingState::default();
        for record in self.list_markings()? {
            let id = NodeId::new(record.node_id);
            if record.is_ignored {
                state.ignored.insert(id.clone());
            }
            state.markings.insert(
                id,
                Marking {
                    is_ignored: record.is_ignored,
                    is_marked_for_swap: record.is_marked_for_swap,
                },
            );
        }
        Ok(state)
    }

    /// Insert a scan run record and return its row id.
    pub fn insert_scan_run(&self, record: &ScanRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO scan_runs (document, document_hash, total_icons, inconsistencies, ignored_count, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.document,
                record.document_hash,
                record.total_icons,
                record.inconsistencies,
                record.ignored_count,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List scan runs, optionally filtered by document.
    pub fn list_scan_runs(&self, document: Option<&str>) -> DbResult<Vec<ScanRunRecord>> {
        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScanRunRecord> {
            Ok(ScanRunRecord {
                document: row.get(0)?,
                document_hash: row.get(1)?,
                total_icons: row.get(2)?,
                inconsistencies: row.get(3)?,
                ignored_count: row.get(4)?,
                started_at: row.get(5)?,
                finished_at: row.get(6)?,
            })
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT document, document_hash, total_icons, inconsistencies, ignored_count, started_at, finished_at
            FROM scan_runs
            WHERE ?1 IS NULL OR document = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![document], map_run)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert a consolidation run record and return its row id.
    pub fn insert_consolidation_run(&self, record: &ConsolidationRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO consolidation_runs (document, scope, components_created, icons_replaced, pages_affected, failed_operations, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.document,
                record.scope,
                record.components_created,
                record.icons_replaced,
                record.pages_affected,
                record.failed_operations,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List consolidation runs, optionally filtered by document.
    pub fn list_consolidation_runs(
        &self,
        document: Option<&str>,
    ) -> DbResult<Vec<ConsolidationRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT document, scope, components_created, icons_replaced, pages_affected, failed_operations, started_at, finished_at
            FROM consolidation_runs
            WHERE ?1 IS NULL OR document = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![document], |row| {
            Ok(ConsolidationRunRecord {
                document: row.get(0)?,
                scope: row.get(1)?,
                components_created: row.get(2)?,
                icons_replaced: row.get(3)?,
                pages_affected: row.get(4)?,
                failed_operations: row.get(5)?,
                started_at: row.get(6)?,
                finished_at: row.get(7)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: markings
/// - 2: scan_runs and consolidation_runs
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS markings (
                node_id            TEXT PRIMARY KEY,
                is_ignored         INTEGER NOT NULL DEFAULT 0,
                is_marked_for_swap INTEGER NOT NULL DEFAULT 0,
                updated_at         TEXT NOT NULL
            );
            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS scan_runs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                document        TEXT NOT NULL,
                document_hash   TEXT,
                total_icons     INTEGER NOT NULL,
                inconsistencies INTEGER NOT NULL,
                ignored_count   INTEGER NOT NULL,
                started_at      TEXT NOT NULL,
                finished_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS consolidation_runs (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                document           TEXT NOT NULL,
                scope              TEXT NOT NULL,
                components_created INTEGER NOT NULL,
                icons_replaced     INTEGER NOT NULL,
                pages_affected     INTEGER NOT NULL,
                failed_operations  INTEGER NOT NULL,
                started_at         TEXT NOT NULL,
                finished_at        TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
