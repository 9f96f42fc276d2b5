use super::{merge_json, Database};
use crate::errors::{AppError, AppResult};
use crate::models::AppSettings;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

const APP_SETTINGS_KEY: &str = "app";

impl Database {
    pub fn get_settings(&self) -> AppResult<AppSettings> {
        let conn = self.lock()?;
        read_settings(&conn)
    }

    /// Deep-merges `update` into the current settings and persists the result.
    /// The read and the write happen under one lock so concurrent patches
    /// never drop each other's keys.
    pub fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let conn = self.lock()?;
        let mut merged = serde_json::to_value(read_settings(&conn)?)?;
        merge_json(&mut merged, update);
        let settings: AppSettings = serde_json::from_value(merged)
            .map_err(|error| AppError::Validation(format!("invalid settings: {}", error)))?;
        validate_settings(&settings)?;

        conn.execute(
            "INSERT INTO Settings (key, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![APP_SETTINGS_KEY, serde_json::to_string(&settings)?, Utc::now().to_rfc3339()],
        )?;
        tracing::info!(settings = ?settings, "settings updated");

        Ok(settings)
    }

    pub(super) fn ensure_default_settings(&self) -> AppResult<()> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM Settings WHERE key = ?1",
            [APP_SETTINGS_KEY],
            |row| row.get(0),
        )?;
        if count == 0 {
            conn.execute(
                "INSERT INTO Settings (key, value_json, updated_at) VALUES (?1, ?2, ?3)",
                params![
                    APP_SETTINGS_KEY,
                    serde_json::to_string(&AppSettings::default())?,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        Ok(())
    }
}

fn read_settings(conn: &Connection) -> AppResult<AppSettings> {
    let raw = conn
        .query_row(
            "SELECT value_json FROM Settings WHERE key = ?1",
            [APP_SETTINGS_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|error| {
            tracing::warn!(error = %error, "stored settings are unreadable, using defaults");
            AppSettings::default()
        })),
        None => Ok(AppSettings::default()),
    }
}

fn validate_settings(settings: &AppSettings) -> AppResult<()> {
    if settings.default_step_goal <= 0 {
        return Err(AppError::Validation("defaultStepGoal must be positive".to_string()));
    }
    if settings.mood_window_days <= 0 {
        return Err(AppError::Validation("moodWindowDays must be positive".to_string()));
    }
    if settings.calories_per_step < 0.0 || settings.km_per_step < 0.0 {
        return Err(AppError::Validation("per-step factors must not be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, DB_FILE_NAME};
    use crate::models::{AppSettings, DayBoundaryPolicy};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn defaults_are_seeded_on_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join(DB_FILE_NAME)).expect("db");
        assert_eq!(db.get_settings().expect("settings"), AppSettings::default());
    }

    #[test]
    fn partial_update_merges_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join(DB_FILE_NAME);
        let db = Database::new(&db_path).expect("db");

        let updated = db
            .update_settings(serde_json::json!({
                "dayBoundaryPolicy": "baseline-subtraction",
                "defaultStepGoal": 8000
            }))
            .expect("update");
        assert_eq!(updated.day_boundary_policy, DayBoundaryPolicy::BaselineSubtraction);
        assert_eq!(updated.default_step_goal, 8000);
        assert_eq!(updated.mood_window_days, 7);
        drop(db);

        let reopened = Database::new(&db_path).expect("reopen");
        assert_eq!(reopened.get_settings().expect("settings"), updated);
    }

    #[test]
    fn invalid_updates_are_rejected_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join(DB_FILE_NAME)).expect("db");

        assert!(db.update_settings(serde_json::json!({ "defaultStepGoal": 0 })).is_err());
        assert!(db.update_settings(serde_json::json!({ "dayBoundaryPolicy": "sometimes" })).is_err());
        assert_eq!(db.get_settings().expect("settings"), AppSettings::default());
    }

    #[test]
    fn concurrent_patches_keep_every_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Arc::new(Database::new(&dir.path().join(DB_FILE_NAME)).expect("db"));

        let workers: Vec<_> = (0..8)
            .map(|index| {
                let db = db.clone();
                thread::spawn(move || {
                    let patch = if index % 2 == 0 {
                        serde_json::json!({ "defaultStepGoal": 6000 + index })
                    } else {
                        serde_json::json!({ "moodWindowDays": 10 + index })
                    };
                    db.update_settings(patch).expect("patch");
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker");
        }

        let settings = db.get_settings().expect("settings");
        assert_ne!(settings.default_step_goal, AppSettings::default().default_step_goal);
        assert_ne!(settings.mood_window_days, AppSettings::default().mood_window_days);
    }
}
