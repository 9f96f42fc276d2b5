use super::{conversion_error, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Mood, MoodSample, MISSING_ANSWER, MOOD_QUESTION_COUNT};
use chrono::Utc;
use rusqlite::params;
use std::sync::Arc;

const MILLIS_PER_DAY: i64 = 86_400_000;

const SAMPLE_COLUMNS: &str = "log_id, mood, note, question1, question2, question3, question4, question5, \
                              question6, question7, logged_at";

/// Append-only mood log.
#[derive(Debug, Clone)]
pub struct MoodStore {
    db: Arc<Database>,
}

impl MoodStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Records a sample stamped with the current time.
    pub fn add<S: AsRef<str>>(&self, mood: Mood, note: &str, answers: &[S]) -> AppResult<i64> {
        self.add_at(mood, note, answers, Utc::now().timestamp_millis())
    }

    /// Records a sample at `logged_at` (epoch milliseconds). Answers past the
    /// seventh are ignored.
    pub fn add_at<S: AsRef<str>>(
        &self,
        mood: Mood,
        note: &str,
        answers: &[S],
        logged_at: i64,
    ) -> AppResult<i64> {
        if answers.len() < MOOD_QUESTION_COUNT {
            return Err(AppError::Validation("All 7 questions must be answered.".to_string()));
        }
        let a: Vec<&str> = answers
            .iter()
            .take(MOOD_QUESTION_COUNT)
            .map(AsRef::as_ref)
            .collect();

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO MoodLogs (
               mood, note, question1, question2, question3, question4, question5, question6, question7, logged_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![mood.as_str(), note, a[0], a[1], a[2], a[3], a[4], a[5], a[6], logged_at],
        )
        .map_err(|error| {
            tracing::error!(mood = %mood, error = %error, "failed to record mood sample");
            AppError::from(error)
        })?;
        let id = conn.last_insert_rowid();
        tracing::debug!(log_id = id, mood = %mood, logged_at, "mood sample recorded");
        Ok(id)
    }

    /// Newest first.
    pub fn list_all(&self) -> AppResult<Vec<MoodSample>> {
        self.list_since(i64::MIN)
    }

    /// Samples logged in the last `days` days, newest first.
    pub fn list_within_days(&self, days: i64) -> AppResult<Vec<MoodSample>> {
        if days < 0 {
            return Err(AppError::Validation("day window must not be negative".to_string()));
        }
        let cutoff = Utc::now().timestamp_millis().saturating_sub(days.saturating_mul(MILLIS_PER_DAY));
        self.list_since(cutoff)
    }

    /// Samples with `logged_at >= cutoff` (epoch milliseconds), newest first.
    pub fn list_since(&self, cutoff: i64) -> AppResult<Vec<MoodSample>> {
        let conn = self.db.lock()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM MoodLogs WHERE logged_at >= ?1 ORDER BY logged_at DESC, log_id DESC"
        ))?;
        let samples = statement
            .query_map([cutoff], parse_sample_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(samples)
    }
}

fn parse_sample_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MoodSample> {
    let raw_mood: String = row.get(1)?;
    let mood = Mood::parse(&raw_mood)
        .ok_or_else(|| conversion_error(format!("Unknown mood marker '{}'", raw_mood)))?;

    let answers: [String; MOOD_QUESTION_COUNT] = (0..MOOD_QUESTION_COUNT)
        .map(|index| {
            row.get::<_, Option<String>>(3 + index)
                .map(|answer| answer.unwrap_or_else(|| MISSING_ANSWER.to_string()))
        })
        .collect::<rusqlite::Result<Vec<_>>>()?
        .try_into()
        .map_err(|_| conversion_error("mood sample must carry 7 answers".to_string()))?;

    Ok(MoodSample {
        id: row.get(0)?,
        mood,
        note: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        answers,
        logged_at: row.get(10)?,
    })
}
