use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{AppSettings, DailySteps, DayBoundaryPolicy, FitnessSummary};
use chrono::{Days, Local, NaiveDate};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

/// Step goal, today's step count and the per-day step history.
#[derive(Debug, Clone)]
pub struct FitnessStore {
    db: Arc<Database>,
}

impl FitnessStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Reads the goal, inserting the configured default when the row is missing.
    pub fn get_goal(&self) -> AppResult<i64> {
        let default_goal = self.db.get_settings()?.default_step_goal;

        let conn = self.db.lock()?;
        let goal = conn
            .query_row("SELECT goal FROM StepGoals WHERE id = 1", [], |row| row.get::<_, i64>(0))
            .optional()?;
        match goal {
            Some(goal) => Ok(goal),
            None => {
                conn.execute(
                    "INSERT OR IGNORE INTO StepGoals (id, goal) VALUES (1, ?1)",
                    [default_goal],
                )?;
                tracing::info!(goal = default_goal, "default step goal inserted");
                Ok(default_goal)
            }
        }
    }

    pub fn set_goal(&self, goal: i64) -> AppResult<()> {
        if goal <= 0 {
            return Err(AppError::Validation("step goal must be positive".to_string()));
        }
        let conn = self.db.lock()?;
        conn.execute("INSERT OR REPLACE INTO StepGoals (id, goal) VALUES (1, ?1)", [goal])?;
        tracing::info!(goal, "step goal updated");
        Ok(())
    }

    /// Converts the sensor's cumulative since-boot total into steps taken
    /// today, according to the configured [`DayBoundaryPolicy`].
    pub fn compute_today_steps(&self, total_since_boot: i64) -> AppResult<i64> {
        self.compute_steps_on(total_since_boot, Local::now().date_naive())
    }

    pub fn compute_steps_on(&self, total_since_boot: i64, day: NaiveDate) -> AppResult<i64> {
        if total_since_boot < 0 {
            return Err(AppError::Validation("sensor step total must not be negative".to_string()));
        }
        let settings = self.db.get_settings()?;
        match settings.day_boundary_policy {
            DayBoundaryPolicy::Passthrough => Ok(total_since_boot),
            DayBoundaryPolicy::BaselineSubtraction => self.subtract_baseline(total_since_boot, day, &settings),
        }
    }

    /// The first reading of `day` becomes its baseline. A reading below the
    /// last one seen that day means the device rebooted and the counter
    /// restarted at zero, so the steps counted so far are carried over by
    /// lowering the baseline. A reboot followed by more steps than were
    /// counted before it cannot be detected.
    fn subtract_baseline(&self, total: i64, day: NaiveDate, settings: &AppSettings) -> AppResult<i64> {
        let day_key = day.format("%Y-%m-%d").to_string();
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT baseline, last_total FROM StepBaselines WHERE day = ?1",
                [&day_key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let baseline = match existing {
            None => {
                tx.execute(
                    "INSERT INTO StepBaselines (day, baseline, last_total) VALUES (?1, ?2, ?2)",
                    params![day_key, total],
                )?;
                tracing::info!(day = %day_key, baseline = total, "recorded step baseline");
                total
            }
            Some((baseline, last_total)) if total < last_total => {
                let carried = baseline - last_total;
                tx.execute(
                    "UPDATE StepBaselines SET baseline = ?1, last_total = ?2 WHERE day = ?3",
                    params![carried, total, day_key],
                )?;
                tracing::info!(day = %day_key, last_total, total, "step sensor reset detected");
                carried
            }
            Some((baseline, _)) => {
                tx.execute(
                    "UPDATE StepBaselines SET last_total = ?1 WHERE day = ?2",
                    params![total, day_key],
                )?;
                baseline
            }
        };

        let steps = (total - baseline).max(0);
        tx.execute(
            "INSERT INTO StepCounts (steps, calories, distance, logged_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(logged_at) DO UPDATE SET
               steps = excluded.steps, calories = excluded.calories, distance = excluded.distance",
            params![
                steps,
                calories_for(steps, settings),
                distance_for(steps, settings),
                day_key
            ],
        )?;
        tx.commit()?;

        Ok(steps)
    }

    pub fn summary(&self, today_steps: i64) -> AppResult<FitnessSummary> {
        let goal = self.get_goal()?;
        let settings = self.db.get_settings()?;
        Ok(fitness_summary(today_steps, goal, &settings))
    }

    /// Recorded days within the last `days` days including today, newest first.
    pub fn list_daily_steps(&self, days: u64) -> AppResult<Vec<DailySteps>> {
        self.list_daily_steps_until(days, Local::now().date_naive())
    }

    pub fn list_daily_steps_until(&self, days: u64, today: NaiveDate) -> AppResult<Vec<DailySteps>> {
        let first_day = today
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);

        let conn = self.db.lock()?;
        let mut statement = conn.prepare(
            "SELECT logged_at, steps, calories, distance FROM StepCounts
             WHERE logged_at >= ?1 AND logged_at <= ?2 ORDER BY logged_at DESC",
        )?;
        let rows = statement
            .query_map(
                params![first_day.format("%Y-%m-%d").to_string(), today.format("%Y-%m-%d").to_string()],
                |row| {
                    Ok(DailySteps {
                        day: row.get(0)?,
                        steps: row.get(1)?,
                        calories: row.get(2)?,
                        distance_km: row.get(3)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

pub fn fitness_summary(steps: i64, goal: i64, settings: &AppSettings) -> FitnessSummary {
    let steps = steps.max(0);
    let progress = if goal > 0 {
        (steps as f64 / goal as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    FitnessSummary {
        steps,
        goal,
        calories: calories_for(steps, settings),
        distance_km: distance_for(steps, settings),
        progress,
    }
}

fn calories_for(steps: i64, settings: &AppSettings) -> i64 {
    (steps as f64 * settings.calories_per_step).floor() as i64
}

fn distance_for(steps: i64, settings: &AppSettings) -> f64 {
    steps as f64 * settings.km_per_step
}
