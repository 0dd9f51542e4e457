//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - The timer snapshot (key-value table)
//! - Tasks and projects, each kept as one JSON document
//! - A log of completed intervals
//! - The lease of the process currently ticking the timer

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::ports::{SnapshotStore, TaskLedger};
use crate::task::{ProjectStore, Task, TaskStore};
use crate::timer::{IntervalType, TimerSnapshot};

const TIMER_KEY: &str = "pomodoro-timer-state";
const TASKS_KEY: &str = "focus-todo-tasks";
const PROJECTS_KEY: &str = "focus-todo-projects";

/// One row of the `intervals` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub id: i64,
    pub task_id: Option<String>,
    pub interval_type: IntervalType,
    pub duration_min: u32,
    pub completed_at: DateTime<Utc>,
}

/// SQLite database holding every piece of persisted state.
pub struct Database {
    pub(super) conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/focustodo.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focustodo.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS intervals (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id       TEXT,
                interval_type TEXT NOT NULL,
                duration_min  INTEGER NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_completed_at ON intervals(completed_at);

            CREATE TABLE IF NOT EXISTS timer_lease (
                id           INTEGER PRIMARY KEY CHECK (id = 1),
                owner        TEXT NOT NULL,
                heartbeat_ms INTEGER NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            DatabaseError::CorruptDocument {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn save_document<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv_set(key, &raw)
    }

    /// Append a completed interval to the log.
    pub fn record_interval(
        &self,
        task_id: Option<&str>,
        interval_type: IntervalType,
        duration_min: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO intervals (task_id, interval_type, duration_min, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                task_id,
                interval_type.as_str(),
                duration_min,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent intervals first.
    pub fn recent_intervals(&self, limit: usize) -> Result<Vec<IntervalRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, interval_type, duration_min, completed_at
             FROM intervals
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, task_id, kind, duration_min, completed_at) = row?;
            let interval_type = kind
                .parse::<IntervalType>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                .with_timezone(&Utc);
            records.push(IntervalRecord {
                id,
                task_id,
                interval_type,
                duration_min,
                completed_at,
            });
        }
        Ok(records)
    }

    /// Task list, empty when nothing was saved yet.
    pub fn load_tasks(&self) -> Result<TaskStore> {
        Ok(self.load_document(TASKS_KEY)?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &TaskStore) -> Result<()> {
        self.save_document(TASKS_KEY, tasks)
    }

    pub fn load_projects(&self) -> Result<ProjectStore> {
        Ok(self.load_document(PROJECTS_KEY)?.unwrap_or_default())
    }

    pub fn save_projects(&self, projects: &ProjectStore) -> Result<()> {
        self.save_document(PROJECTS_KEY, projects)
    }
}

impl SnapshotStore for Database {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        self.load_document(TIMER_KEY)
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        self.save_document(TIMER_KEY, snapshot)
    }
}

impl TaskLedger for Database {
    fn find_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.load_tasks()?.get(id).cloned())
    }

    fn increment_completed_intervals(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut tasks = self.load_tasks()?;
        if !tasks.increment_completed_pomodoros(id, at) {
            return Err(crate::error::ValidationError::NotFound {
                kind: "task",
                id: id.to_string(),
            }
            .into());
        }
        self.save_tasks(&tasks)
    }
}
