use crate::analytics;
use crate::db::fitness::FitnessStore;
use crate::db::journal::JournalStore;
use crate::db::mood::MoodStore;
use crate::db::{Database, DB_FILE_NAME};
use crate::errors::{AppError, AppResult};
use crate::images::{remove_journal_image, store_journal_image};
use crate::models::{AppSettings, DailySteps, FitnessSummary, JournalEntry, Mood, MoodSample, MoodSummary};
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What to do with a journal entry's image on edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    Keep,
    Replace(PathBuf),
    Remove,
}

/// Async entry point for presentation layers. Every call runs on tokio's
/// blocking pool and reads the database fresh; nothing is cached here.
#[derive(Debug, Clone)]
pub struct JournalService {
    db: Arc<Database>,
    journal: JournalStore,
    mood: MoodStore,
    fitness: FitnessStore,
    data_dir: PathBuf,
}

impl JournalService {
    pub fn new(data_dir: PathBuf) -> AppResult<Self> {
        let db = Arc::new(Database::new(&data_dir.join(DB_FILE_NAME))?);
        Ok(Self::with_database(db, data_dir))
    }

    pub fn with_database(db: Arc<Database>, data_dir: PathBuf) -> Self {
        Self {
            journal: JournalStore::new(db.clone()),
            mood: MoodStore::new(db.clone()),
            fitness: FitnessStore::new(db.clone()),
            db,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn blocking<T, F>(&self, task: F) -> AppResult<T>
    where
        F: FnOnce(&JournalService) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || task(&this)).await?
    }

    pub async fn add_journal_entry(
        &self,
        title: String,
        content: String,
        image_source: Option<PathBuf>,
    ) -> AppResult<JournalEntry> {
        self.blocking(move |service| {
            let image_path = image_source
                .as_deref()
                .map(|source| store_journal_image(&service.data_dir, source))
                .transpose()?;
            let image_text = image_path.as_ref().map(|path| path.to_string_lossy().into_owned());

            let id = match service.journal.add(&title, &content, Utc::now(), image_text.as_deref()) {
                Ok(id) => id,
                Err(error) => {
                    if let Some(path) = &image_path {
                        let _ = remove_journal_image(&service.data_dir, path);
                    }
                    return Err(error);
                }
            };
            service.require_entry(id)
        })
        .await
    }

    pub async fn journal_entry(&self, id: i64) -> AppResult<Option<JournalEntry>> {
        self.blocking(move |service| service.journal.get(id)).await
    }

    pub async fn list_journal_entries(&self, favorites_only: bool) -> AppResult<Vec<JournalEntry>> {
        self.blocking(move |service| {
            if favorites_only {
                service.journal.list_favorited()
            } else {
                service.journal.list_all()
            }
        })
        .await
    }

    pub async fn update_journal_entry(
        &self,
        id: i64,
        content: String,
        image: ImageUpdate,
    ) -> AppResult<JournalEntry> {
        self.blocking(move |service| {
            let current = service.require_entry(id)?;
            let (new_image, copied) = match image {
                ImageUpdate::Keep => (current.image_path.clone(), None),
                ImageUpdate::Remove => (None, None),
                ImageUpdate::Replace(source) => {
                    let copied = store_journal_image(&service.data_dir, &source)?;
                    (Some(copied.to_string_lossy().into_owned()), Some(copied))
                }
            };

            let updated = service.journal.update(id, &content, new_image.as_deref());
            if !matches!(updated, Ok(true)) {
                if let Some(path) = &copied {
                    let _ = remove_journal_image(&service.data_dir, path);
                }
                updated?;
                return Err(AppError::NotFound(format!("journal entry {}", id)));
            }
            if current.image_path != new_image {
                service.discard_image(current.image_path.as_deref());
            }
            service.require_entry(id)
        })
        .await
    }

    pub async fn delete_journal_entry(&self, id: i64) -> AppResult<bool> {
        self.blocking(move |service| {
            let Some(entry) = service.journal.get(id)? else {
                return Ok(false);
            };
            let removed = service.journal.delete(id)?;
            if removed {
                service.discard_image(entry.image_path.as_deref());
            }
            Ok(removed)
        })
        .await
    }

    pub async fn set_journal_favorited(&self, id: i64, favorited: bool) -> AppResult<JournalEntry> {
        self.blocking(move |service| {
            if !service.journal.set_favorited(id, favorited)? {
                return Err(AppError::NotFound(format!("journal entry {}", id)));
            }
            service.require_entry(id)
        })
        .await
    }

    pub async fn record_mood(&self, mood: Mood, note: String, answers: Vec<String>) -> AppResult<i64> {
        self.blocking(move |service| service.mood.add(mood, &note, &answers)).await
    }

    /// All samples, or only those from the last `days` days.
    pub async fn list_moods(&self, days: Option<i64>) -> AppResult<Vec<MoodSample>> {
        self.blocking(move |service| match days {
            Some(days) => service.mood.list_within_days(days),
            None => service.mood.list_all(),
        })
        .await
    }

    /// Summary over the configured rolling window of calendar days.
    pub async fn mood_summary(&self) -> AppResult<MoodSummary> {
        self.blocking(|service| {
            let days = service.db.get_settings()?.mood_window_days;
            let samples = service.mood.list_within_days(days)?;
            let window = analytics::within_calendar_days(&samples, Local::now().date_naive(), days);
            Ok(analytics::summarize_window(&window, days))
        })
        .await
    }

    pub async fn step_goal(&self) -> AppResult<i64> {
        self.blocking(|service| service.fitness.get_goal()).await
    }

    pub async fn set_step_goal(&self, goal: i64) -> AppResult<()> {
        self.blocking(move |service| service.fitness.set_goal(goal)).await
    }

    /// Takes the latest cumulative sensor reading and reports today's progress.
    pub async fn today_steps(&self, total_since_boot: i64) -> AppResult<FitnessSummary> {
        self.blocking(move |service| {
            let steps = service.fitness.compute_today_steps(total_since_boot)?;
            service.fitness.summary(steps)
        })
        .await
    }

    pub async fn daily_steps(&self, days: u64) -> AppResult<Vec<DailySteps>> {
        self.blocking(move |service| service.fitness.list_daily_steps(days)).await
    }

    pub async fn settings(&self) -> AppResult<AppSettings> {
        self.blocking(|service| service.db.get_settings()).await
    }

    pub async fn update_settings(&self, patch: serde_json::Value) -> AppResult<AppSettings> {
        self.blocking(move |service| service.db.update_settings(patch)).await
    }

    fn require_entry(&self, id: i64) -> AppResult<JournalEntry> {
        self.journal
            .get(id)?
            .ok_or_else(|| AppError::NotFound(format!("journal entry {}", id)))
    }

    fn discard_image(&self, path: Option<&str>) {
        if let Some(path) = path {
            if let Err(error) = remove_journal_image(&self.data_dir, Path::new(path)) {
                tracing::warn!(path, error = %error, "failed to remove replaced journal image");
            }
        }
    }
}
