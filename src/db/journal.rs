use super::{parse_time, Database};
use crate::errors::{AppError, AppResult};
use crate::models::JournalEntry;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

const ENTRY_COLUMNS: &str = "entry_id, title, content, image_path, loves, created_at";

/// Journal entries. Every failure is logged here and returned to the caller.
#[derive(Debug, Clone)]
pub struct JournalStore {
    db: Arc<Database>,
}

impl JournalStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn add(
        &self,
        title: &str,
        content: &str,
        created_at: DateTime<Utc>,
        image_path: Option<&str>,
    ) -> AppResult<i64> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO JournalEntries (title, content, created_at, image_path, loves)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![title, content, created_at.to_rfc3339(), image_path],
        )
        .map_err(logged("add"))?;
        let id = conn.last_insert_rowid();
        tracing::debug!(entry_id = id, "journal entry added");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> AppResult<Option<JournalEntry>> {
        let conn = self.db.lock()?;
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM JournalEntries WHERE entry_id = ?1"),
            [id],
            parse_entry_row,
        )
        .optional()
        .map_err(logged("get"))
    }

    /// Newest first.
    pub fn list_all(&self) -> AppResult<Vec<JournalEntry>> {
        self.query_entries("", "list_all")
    }

    /// Same ordering as [`list_all`](Self::list_all), favorited entries only.
    pub fn list_favorited(&self) -> AppResult<Vec<JournalEntry>> {
        self.query_entries("WHERE loves <> 0", "list_favorited")
    }

    pub fn delete(&self, id: i64) -> AppResult<bool> {
        let conn = self.db.lock()?;
        let removed = conn
            .execute("DELETE FROM JournalEntries WHERE entry_id = ?1", [id])
            .map_err(logged("delete"))?;
        tracing::debug!(entry_id = id, removed, "journal entry deleted");
        Ok(removed > 0)
    }

    /// Replaces content and image. Title and favorite state are left alone.
    pub fn update(&self, id: i64, new_content: &str, new_image_path: Option<&str>) -> AppResult<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute(
                "UPDATE JournalEntries SET content = ?1, image_path = ?2 WHERE entry_id = ?3",
                params![new_content, new_image_path, id],
            )
            .map_err(logged("update"))?;
        Ok(changed > 0)
    }

    /// Stores the raw favorite marker. Any non-zero value counts as favorited.
    pub fn set_favorite_count(&self, id: i64, value: i64) -> AppResult<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute(
                "UPDATE JournalEntries SET loves = ?1 WHERE entry_id = ?2",
                params![value, id],
            )
            .map_err(logged("set_favorite_count"))?;
        Ok(changed > 0)
    }

    pub fn set_favorited(&self, id: i64, favorited: bool) -> AppResult<bool> {
        self.set_favorite_count(id, i64::from(favorited))
    }

    fn query_entries(&self, filter: &str, operation: &'static str) -> AppResult<Vec<JournalEntry>> {
        let conn = self.db.lock()?;
        let mut statement = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM JournalEntries {filter} ORDER BY created_at DESC, entry_id DESC"
            ))
            .map_err(logged(operation))?;
        let entries = statement
            .query_map([], parse_entry_row)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(logged(operation))?;
        Ok(entries)
    }
}

fn logged(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |error| {
        tracing::warn!(operation, error = %error, "journal store operation failed");
        AppError::from(error)
    }
}

fn parse_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_path: row.get(3)?,
        favorited: row.get::<_, Option<i64>>(4)?.unwrap_or(0) != 0,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
    })
}
