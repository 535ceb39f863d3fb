//! SQLite-based task storage.
//!
//! Provides persistent storage for:
//! - Task records
//! - Categories
//! - Routines and task templates
//! - Key-value store for application state
//!
//! Enum-valued columns hold the snake_case labels of their domain types;
//! timestamps are RFC 3339 strings.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, Result};
use crate::task::routine::Routine;
use crate::task::template::TaskTemplate;
use crate::task::{Category, TaskRecord};

/// SQLite database for tasks, categories, routines, and templates.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/tasktally/tasktally.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("tasktally.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|err| {
            CoreError::Database(DatabaseError::QueryFailed(err.to_string()))
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id               TEXT PRIMARY KEY,
                    title            TEXT NOT NULL,
                    status           TEXT NOT NULL,
                    created_at       TEXT NOT NULL,
                    due_at           TEXT NOT NULL,
                    completed_at     TEXT,
                    postpone_count   INTEGER NOT NULL DEFAULT 0,
                    postpone_history TEXT,
                    kind             TEXT NOT NULL,
                    is_routine_task  INTEGER NOT NULL DEFAULT 0,
                    has_recurrence   INTEGER NOT NULL DEFAULT 0,
                    is_special       INTEGER NOT NULL DEFAULT 0,
                    category         TEXT,
                    priority         TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS categories (
                    id   TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS routines (
                    id         TEXT PRIMARY KEY,
                    body       TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS templates (
                    id         TEXT PRIMARY KEY,
                    body       TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_due_at ON tasks(due_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);",
            )
            .map_err(|err| DatabaseError::MigrationFailed(err.to_string()))?;
        Ok(())
    }

    /// Insert or replace a task record.
    pub fn upsert_task(&self, task: &TaskRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO tasks (
                    id, title, status, created_at, due_at, completed_at,
                    postpone_count, postpone_history, kind,
                    is_routine_task, has_recurrence, is_special,
                    category, priority
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    task.id,
                    task.title,
                    task.status.as_str(),
                    task.created_at.to_rfc3339(),
                    task.due_at.to_rfc3339(),
                    task.completed_at.map(|ts| ts.to_rfc3339()),
                    task.postpone_count,
                    task.postpone_history,
                    task.kind.as_str(),
                    task.is_routine_task,
                    task.has_recurrence,
                    task.is_special,
                    task.category,
                    task.priority.as_str(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Fetch a task by id.
    pub fn get_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM tasks WHERE id = ?1")
            .map_err(DatabaseError::from)?;
        let mut rows = stmt
            .query_map(params![id], task_row)
            .map_err(DatabaseError::from)?;
        match rows.next() {
            Some(row) => Ok(Some(decode_task(row.map_err(DatabaseError::from)?)?)),
            None => Ok(None),
        }
    }

    /// List all task records.
    pub fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM tasks ORDER BY due_at")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], task_row)
            .map_err(DatabaseError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?;

        rows.into_iter().map(decode_task).collect()
    }

    /// Delete a task. Returns whether a row was removed.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(DatabaseError::from)?;
        Ok(changed > 0)
    }

    /// Insert or replace a category.
    pub fn upsert_category(&self, category: &Category) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO categories (id, name) VALUES (?1, ?2)",
                params![category.id, category.name],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// List all categories.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// Insert or replace a routine.
    pub fn upsert_routine(&self, routine: &Routine) -> Result<()> {
        self.upsert_json("routines", &routine.id, routine)
    }

    /// Fetch a routine by id.
    pub fn get_routine(&self, id: &str) -> Result<Option<Routine>> {
        self.get_json("routines", id)
    }

    /// List all routines.
    pub fn list_routines(&self) -> Result<Vec<Routine>> {
        self.list_json("routines")
    }

    /// Insert or replace a template.
    pub fn upsert_template(&self, template: &TaskTemplate) -> Result<()> {
        self.upsert_json("templates", &template.id, template)
    }

    /// Fetch a template by id.
    pub fn get_template(&self, id: &str) -> Result<Option<TaskTemplate>> {
        self.get_json("templates", id)
    }

    /// List all templates.
    pub fn list_templates(&self) -> Result<Vec<TaskTemplate>> {
        self.list_json("templates")
    }

    /// Delete a template. Returns whether a row was removed.
    pub fn delete_template(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM templates WHERE id = ?1", params![id])
            .map_err(DatabaseError::from)?;
        Ok(changed > 0)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(DatabaseError::from)?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(DatabaseError::from(err).into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn upsert_json<T: serde::Serialize>(&self, table: &str, id: &str, value: &T) -> Result<()> {
        let body = serde_json::to_string(value)?;
        self.conn
            .execute(
                &format!("INSERT OR REPLACE INTO {table} (id, body) VALUES (?1, ?2)"),
                params![id, body],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT body FROM {table} WHERE id = ?1"))
            .map_err(DatabaseError::from)?;
        let result = stmt.query_row(params![id], |row| row.get::<_, String>(0));
        match result {
            Ok(body) => Ok(Some(decode_json(table, &body)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(DatabaseError::from(err).into()),
        }
    }

    fn list_json<T: serde::de::DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT body FROM {table} ORDER BY id"))
            .map_err(DatabaseError::from)?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(DatabaseError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(DatabaseError::from)?;

        bodies.iter().map(|body| decode_json(table, body)).collect()
    }
}

/// Raw task row before domain decoding.
struct TaskRow {
    id: String,
    title: String,
    status: String,
    created_at: String,
    due_at: String,
    completed_at: Option<String>,
    postpone_count: u32,
    postpone_history: Option<String>,
    kind: String,
    is_routine_task: bool,
    has_recurrence: bool,
    is_special: bool,
    category: Option<String>,
    priority: String,
}

fn task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get("id")?,
        title: row.get("title")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        due_at: row.get("due_at")?,
        completed_at: row.get("completed_at")?,
        postpone_count: row.get("postpone_count")?,
        postpone_history: row.get("postpone_history")?,
        kind: row.get("kind")?,
        is_routine_task: row.get("is_routine_task")?,
        has_recurrence: row.get("has_recurrence")?,
        is_special: row.get("is_special")?,
        category: row.get("category")?,
        priority: row.get("priority")?,
    })
}

fn decode_task(row: TaskRow) -> Result<TaskRecord> {
    Ok(TaskRecord {
        status: row.status.parse().map_err(|_| corrupt("status", &row.status))?,
        kind: row.kind.parse().map_err(|_| corrupt("kind", &row.kind))?,
        priority: row
            .priority
            .parse()
            .map_err(|_| corrupt("priority", &row.priority))?,
        created_at: decode_ts(&row.created_at)?,
        due_at: decode_ts(&row.due_at)?,
        completed_at: row.completed_at.as_deref().map(decode_ts).transpose()?,
        id: row.id,
        title: row.title,
        postpone_count: row.postpone_count,
        postpone_history: row.postpone_history,
        is_routine_task: row.is_routine_task,
        has_recurrence: row.has_recurrence,
        is_special: row.is_special,
        category: row.category,
    })
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| corrupt("timestamp", raw).into())
}

fn decode_json<T: serde::de::DeserializeOwned>(table: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| {
        CoreError::Database(DatabaseError::CorruptRow {
            table: table.to_string(),
            message: err.to_string(),
        })
    })
}

fn corrupt(field: &str, value: &str) -> CoreError {
    CoreError::Database(DatabaseError::CorruptRow {
        table: "tasks".to_string(),
        message: format!("bad {field} '{value}'"),
    })
}
