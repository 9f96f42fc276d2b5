//! Table definitions and versioned upgrades for the journal database.
//!
//! The schema version lives in `PRAGMA user_version`. A fresh database gets the
//! version 6 baseline tables and then every later step; an existing database
//! runs each step whose version is above its own, in order. The whole upgrade
//! and the version bump share one transaction.

use super::parse_time;
use crate::errors::{AppError, AppResult};
use rusqlite::{params, Connection};

pub const SCHEMA_VERSION: i64 = 7;
pub const DEFAULT_STEP_GOAL: i64 = 10_000;

const BASELINE_VERSION: i64 = 6;

const CREATE_JOURNAL_ENTRIES_TABLE: &str = "CREATE TABLE IF NOT EXISTS JournalEntries (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    image_path TEXT,
    loves INTEGER DEFAULT 0,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_READING_PROGRESS_TABLE: &str = "CREATE TABLE IF NOT EXISTS ReadingProgress (
    progress_id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_title TEXT NOT NULL,
    current_page INTEGER NOT NULL CHECK (current_page <= total_pages),
    total_pages INTEGER NOT NULL,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_STEP_GOALS_TABLE: &str = "CREATE TABLE IF NOT EXISTS StepGoals (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    goal INTEGER NOT NULL CHECK (goal > 0)
)";

fn mood_logs_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    mood TEXT NOT NULL,
    note TEXT,
    question1 TEXT,
    question2 TEXT,
    question3 TEXT,
    question4 TEXT,
    question5 TEXT,
    question6 TEXT,
    question7 TEXT,
    logged_at INTEGER NOT NULL
)"
    )
}

/// `logged_at` as epoch milliseconds. Rows copied by older upgrades still hold
/// `CURRENT_TIMESTAMP` text.
const MOOD_LOGGED_AT_MILLIS: &str = "CASE
    WHEN typeof(logged_at) = 'integer' THEN logged_at
    ELSE COALESCE(CAST(strftime('%s', logged_at) AS INTEGER) * 1000, 0)
END";

fn step_counts_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    step_id INTEGER PRIMARY KEY AUTOINCREMENT,
    steps INTEGER NOT NULL,
    calories INTEGER,
    distance REAL,
    logged_at DATE NOT NULL UNIQUE
)"
    )
}

struct MigrationStep {
    version: i64,
    name: &'static str,
    apply: fn(&Connection) -> AppResult<()>,
}

const MIGRATIONS: &[MigrationStep] = &[
    MigrationStep {
        version: 2,
        name: "journal_image_path",
        apply: add_journal_image_path,
    },
    MigrationStep {
        version: 3,
        name: "journal_loves",
        apply: add_journal_loves,
    },
    MigrationStep {
        version: 4,
        name: "step_counts_rebuild",
        apply: rebuild_step_counts,
    },
    MigrationStep {
        version: 5,
        name: "mood_log_questions",
        apply: rebuild_mood_logs,
    },
    MigrationStep {
        version: 6,
        name: "step_goals",
        apply: create_step_goals,
    },
    MigrationStep {
        version: 7,
        name: "settings_and_step_baselines",
        apply: add_settings_and_baselines,
    },
];

pub fn user_version(conn: &Connection) -> AppResult<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(AppError::from)
}

/// Brings the database to [`SCHEMA_VERSION`] and returns the version reached.
/// Any failure leaves the file at its previous version.
pub fn migrate(conn: &mut Connection) -> AppResult<i64> {
    let current = user_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(AppError::Migration(format!(
            "database version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }
    if current == SCHEMA_VERSION {
        return Ok(current);
    }

    tracing::info!(from = current, to = SCHEMA_VERSION, "upgrading journal database");
    let tx = conn.transaction()?;
    upgrade(&tx, current, SCHEMA_VERSION)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()
        .map_err(|error| AppError::Migration(format!("commit failed: {}", error)))?;

    Ok(SCHEMA_VERSION)
}

/// Applies the steps in `(from, to]`. Does not touch `user_version`.
pub(crate) fn upgrade(conn: &Connection, from: i64, to: i64) -> AppResult<()> {
    let mut version = from;
    if version == 0 {
        create_baseline(conn)
            .map_err(|error| AppError::Migration(format!("baseline schema: {}", error)))?;
        tracing::info!(version = BASELINE_VERSION, "created baseline schema");
        version = BASELINE_VERSION;
    }

    for step in MIGRATIONS {
        if version < step.version && step.version <= to {
            (step.apply)(conn).map_err(|error| {
                tracing::error!(version = step.version, step = step.name, error = %error, "migration step failed");
                AppError::Migration(format!("v{} {}: {}", step.version, step.name, error))
            })?;
            tracing::info!(version = step.version, step = step.name, "applied migration step");
            version = step.version;
        }
    }
    Ok(())
}

fn create_baseline(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(CREATE_JOURNAL_ENTRIES_TABLE)?;
    conn.execute_batch(&mood_logs_ddl("MoodLogs"))?;
    conn.execute_batch(&step_counts_ddl("StepCounts"))?;
    conn.execute_batch(CREATE_READING_PROGRESS_TABLE)?;
    conn.execute_batch(CREATE_STEP_GOALS_TABLE)?;
    insert_default_goal(conn)
}

fn insert_default_goal(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "INSERT INTO StepGoals (id, goal) SELECT 1, ?1 WHERE NOT EXISTS (SELECT 1 FROM StepGoals)",
        [DEFAULT_STEP_GOAL],
    )?;
    Ok(())
}

fn add_journal_image_path(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(CREATE_JOURNAL_ENTRIES_TABLE)?;
    if !column_exists(conn, "JournalEntries", "image_path")? {
        conn.execute("ALTER TABLE JournalEntries ADD COLUMN image_path TEXT", [])?;
    }
    Ok(())
}

fn add_journal_loves(conn: &Connection) -> AppResult<()> {
    if !column_exists(conn, "JournalEntries", "loves")? {
        conn.execute("ALTER TABLE JournalEntries ADD COLUMN loves INTEGER DEFAULT 0", [])?;
    }
    Ok(())
}

fn rebuild_step_counts(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(&step_counts_ddl("StepCounts"))?;

    let calories = if column_exists(conn, "StepCounts", "calories")? { "calories" } else { "NULL" };
    let distance = if column_exists(conn, "StepCounts", "distance")? { "distance" } else { "NULL" };

    conn.execute_batch("DROP TABLE IF EXISTS StepCounts_new")?;
    conn.execute_batch(&step_counts_ddl("StepCounts_new"))?;
    conn.execute_batch(&format!(
        "INSERT INTO StepCounts_new (step_id, steps, calories, distance, logged_at)
         SELECT step_id, steps, {calories}, {distance}, logged_at FROM StepCounts;
         DROP TABLE StepCounts;
         ALTER TABLE StepCounts_new RENAME TO StepCounts;"
    ))?;
    Ok(())
}

fn rebuild_mood_logs(conn: &Connection) -> AppResult<()> {
    if table_exists(conn, "MoodLogs")? && column_exists(conn, "MoodLogs", "question7")? {
        return Ok(());
    }
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS MoodLogs (
           log_id INTEGER PRIMARY KEY AUTOINCREMENT,
           mood TEXT NOT NULL,
           note TEXT,
           logged_at DATETIME DEFAULT CURRENT_TIMESTAMP
         )",
    )?;

    conn.execute_batch("DROP TABLE IF EXISTS MoodLogs_new")?;
    conn.execute_batch(&mood_logs_ddl("MoodLogs_new"))?;
    conn.execute_batch(&format!(
        "INSERT INTO MoodLogs_new (log_id, mood, note, logged_at)
         SELECT log_id, mood, note, {MOOD_LOGGED_AT_MILLIS}
         FROM MoodLogs;
         DROP TABLE MoodLogs;
         ALTER TABLE MoodLogs_new RENAME TO MoodLogs;"
    ))?;
    Ok(())
}

fn create_step_goals(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(CREATE_STEP_GOALS_TABLE)?;
    insert_default_goal(conn)
}

fn add_settings_and_baselines(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS Settings (
           key TEXT PRIMARY KEY,
           value_json TEXT NOT NULL,
           updated_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS StepBaselines (
           day TEXT PRIMARY KEY,
           baseline INTEGER NOT NULL,
           last_total INTEGER NOT NULL
         );",
    )?;

    canonicalize_mood_logs(conn)?;
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_mood_logs_logged_at ON MoodLogs(logged_at);")?;
    normalize_journal_timestamps(conn)?;

    // Databases that went through the old v3 step carry an unused column.
    if column_exists(conn, "JournalEntries", "likes")? {
        conn.execute("ALTER TABLE JournalEntries DROP COLUMN likes", [])?;
    }

    // Older StepGoals tables appended a row per update; keep only the newest.
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS StepGoals_new;
         {};
         INSERT INTO StepGoals_new (id, goal)
         SELECT 1, goal FROM StepGoals WHERE goal > 0 ORDER BY id DESC LIMIT 1;
         DROP TABLE StepGoals;
         ALTER TABLE StepGoals_new RENAME TO StepGoals;",
        CREATE_STEP_GOALS_TABLE.replace("StepGoals", "StepGoals_new")
    ))?;
    insert_default_goal(conn)
}

/// Files upgraded by older releases kept `MoodLogs.logged_at` as DATETIME
/// text. Rebuild those into the epoch-millisecond shape and convert any text
/// values left in an already canonical table.
fn canonicalize_mood_logs(conn: &Connection) -> AppResult<()> {
    if column_type(conn, "MoodLogs", "logged_at")?.as_deref() == Some("INTEGER") {
        conn.execute(
            &format!("UPDATE MoodLogs SET logged_at = {MOOD_LOGGED_AT_MILLIS} WHERE typeof(logged_at) <> 'integer'"),
            [],
        )?;
        return Ok(());
    }

    let columns = "log_id, mood, note, question1, question2, question3, question4, question5, question6, question7";
    conn.execute_batch("DROP TABLE IF EXISTS MoodLogs_new")?;
    conn.execute_batch(&mood_logs_ddl("MoodLogs_new"))?;
    conn.execute_batch(&format!(
        "INSERT INTO MoodLogs_new ({columns}, logged_at)
         SELECT {columns}, {MOOD_LOGGED_AT_MILLIS}
         FROM MoodLogs;
         DROP TABLE MoodLogs;
         ALTER TABLE MoodLogs_new RENAME TO MoodLogs;"
    ))?;
    Ok(())
}

/// Rewrites every `created_at` that is not already RFC 3339 so that ordering by
/// the column is chronological. Unreadable values are left as they are.
fn normalize_journal_timestamps(conn: &Connection) -> AppResult<()> {
    let legacy: Vec<(i64, String)> = conn
        .prepare(
            "SELECT entry_id, created_at FROM JournalEntries
             WHERE typeof(created_at) = 'text' AND created_at NOT GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T*'",
        )?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rewritten = 0;
    for (entry_id, raw) in legacy {
        match parse_time(&raw) {
            Ok(parsed) => {
                conn.execute(
                    "UPDATE JournalEntries SET created_at = ?1 WHERE entry_id = ?2",
                    params![parsed.to_rfc3339(), entry_id],
                )?;
                rewritten += 1;
            }
            Err(error) => {
                tracing::warn!(entry_id, raw = %raw, error = %error, "journal timestamp left unconverted");
            }
        }
    }
    if rewritten > 0 {
        tracing::info!(rewritten, "converted legacy journal timestamps");
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> AppResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_type(conn: &Connection, table: &str, column: &str) -> AppResult<Option<String>> {
    let pragma = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&pragma)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(Some(row.get::<_, String>(2)?.to_ascii_uppercase()));
        }
    }
    Ok(None)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> AppResult<bool> {
    let pragma = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&pragma)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
