use mindful_journal_lib::models::{DayBoundaryPolicy, Mood, MOOD_QUESTIONS};
use mindful_journal_lib::{ImageUpdate, JournalService};
use serde_json::json;
use std::fs;

fn answers() -> Vec<String> {
    MOOD_QUESTIONS.iter().map(|_| "Moderate".to_string()).collect()
}

#[tokio::test]
async fn journal_lifecycle_manages_copied_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().join("data")).expect("service");
    let picked = dir.path().join("sunset.png");
    fs::write(&picked, b"first").expect("write image");

    let entry = service
        .add_journal_entry("Evening".to_string(), "Quiet".to_string(), Some(picked.clone()))
        .await
        .expect("add");
    let first_image = entry.image_path.clone().expect("image copied");
    assert!(first_image.contains("journal_images"));
    assert!(fs::metadata(&first_image).is_ok());

    let replacement = dir.path().join("dawn.jpg");
    fs::write(&replacement, b"second").expect("write replacement");
    let updated = service
        .update_journal_entry(entry.id, "Still quiet".to_string(), ImageUpdate::Replace(replacement))
        .await
        .expect("update");
    assert_eq!(updated.title, "Evening");
    assert_eq!(updated.content, "Still quiet");
    assert!(fs::metadata(&first_image).is_err());

    let second_image = updated.image_path.clone().expect("replacement image");
    assert!(service.delete_journal_entry(entry.id).await.expect("delete"));
    assert!(fs::metadata(&second_image).is_err());
    assert!(picked.exists());
    assert!(!service.delete_journal_entry(entry.id).await.expect("second delete"));
}

#[tokio::test]
async fn favoriting_a_missing_entry_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().to_path_buf()).expect("service");

    let error = service.set_journal_favorited(42, true).await.expect_err("missing");
    assert_eq!(error.code(), "NOT_FOUND");

    let entry = service
        .add_journal_entry("Kept".to_string(), String::new(), None)
        .await
        .expect("add");
    let favorited = service.set_journal_favorited(entry.id, true).await.expect("favorite");
    assert!(favorited.favorited);
    assert_eq!(service.list_journal_entries(true).await.expect("favorites").len(), 1);
}

#[tokio::test]
async fn mood_summary_reflects_recorded_samples() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().to_path_buf()).expect("service");

    let empty = service.mood_summary().await.expect("empty summary");
    assert!(empty.percentages.is_empty());
    assert_eq!(empty.message, "No mood data available for the past 7 days.");

    for mood in [Mood::Sad, Mood::Sad, Mood::Good] {
        service.record_mood(mood, String::new(), answers()).await.expect("record");
    }
    let short = service
        .record_mood(Mood::Great, String::new(), answers()[..3].to_vec())
        .await
        .expect_err("short answers");
    assert_eq!(short.code(), "VALIDATION");

    let summary = service.mood_summary().await.expect("summary");
    assert_eq!(summary.most_frequent, Some(Mood::Sad));
    assert_eq!(
        summary.message,
        "You've been feeling down lately. Consider reaching out to a friend or professional."
    );
    assert_eq!(service.list_moods(Some(1)).await.expect("recent").len(), 3);
}

#[tokio::test]
async fn settings_drive_goal_default_and_step_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().to_path_buf()).expect("service");

    let summary = service.today_steps(5_000).await.expect("passthrough");
    assert_eq!(summary.steps, 5_000);
    assert_eq!(summary.goal, 10_000);
    assert_eq!(summary.calories, 200);
    assert!((summary.progress - 0.5).abs() < 1e-9);

    let settings = service
        .update_settings(json!({ "dayBoundaryPolicy": "baseline-subtraction", "caloriesPerStep": 0.05 }))
        .await
        .expect("update");
    assert_eq!(settings.day_boundary_policy, DayBoundaryPolicy::BaselineSubtraction);
    assert_eq!(settings.mood_window_days, 7);

    service.set_step_goal(2_000).await.expect("goal");
    let first = service.today_steps(40_000).await.expect("baseline");
    assert_eq!(first.steps, 0);
    let later = service.today_steps(43_000).await.expect("later");
    assert_eq!(later.steps, 3_000);
    assert_eq!(later.calories, 150);
    assert_eq!(later.progress, 1.0);

    let history = service.daily_steps(1).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].steps, 3_000);

    let rejected = service.set_step_goal(0).await.expect_err("zero goal");
    assert_eq!(rejected.code(), "VALIDATION");
    assert_eq!(service.step_goal().await.expect("goal"), 2_000);
}

#[tokio::test]
async fn failed_image_replacement_keeps_the_old_image_and_drops_the_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let service = JournalService::new(data_dir.clone()).expect("service");
    let first = dir.path().join("first.jpg");
    fs::write(&first, b"first").expect("write image");

    let entry = service
        .add_journal_entry("Locked".to_string(), "body".to_string(), Some(first))
        .await
        .expect("add");
    let kept_image = entry.image_path.clone().expect("image copied");

    {
        let conn = rusqlite::Connection::open(data_dir.join(mindful_journal_lib::DB_FILE_NAME)).expect("side connection");
        conn.execute_batch(
            "CREATE TRIGGER block_updates BEFORE UPDATE ON JournalEntries
             BEGIN SELECT RAISE(ABORT, 'read only'); END;",
        )
        .expect("trigger");
    }

    let replacement = dir.path().join("second.jpg");
    fs::write(&replacement, b"second").expect("write replacement");
    let error = service
        .update_journal_entry(entry.id, "changed".to_string(), ImageUpdate::Replace(replacement))
        .await
        .expect_err("update must fail");
    assert_eq!(error.code(), "INTERNAL");

    let stored: Vec<_> = fs::read_dir(data_dir.join("journal_images"))
        .expect("image dir")
        .collect::<Result<Vec<_>, _>>()
        .expect("entries");
    assert_eq!(stored.len(), 1);
    assert!(fs::metadata(&kept_image).is_ok());

    let unchanged = service.journal_entry(entry.id).await.expect("get").expect("present");
    assert_eq!(unchanged.content, "body");
    assert_eq!(unchanged.image_path.as_deref(), Some(kept_image.as_str()));
}

#[tokio::test]
async fn editing_a_missing_entry_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().to_path_buf()).expect("service");

    let error = service
        .update_journal_entry(7, "nothing".to_string(), ImageUpdate::Keep)
        .await
        .expect_err("missing");
    assert_eq!(error.code(), "NOT_FOUND");
}

#[tokio::test]
async fn empty_summary_names_the_configured_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = JournalService::new(dir.path().to_path_buf()).expect("service");
    service
        .update_settings(json!({ "moodWindowDays": 14 }))
        .await
        .expect("widen window");

    let summary = service.mood_summary().await.expect("summary");
    assert_eq!(summary.message, "No mood data available for the past 14 days.");

    let negative = service.list_moods(Some(-3)).await.expect_err("negative window");
    assert_eq!(negative.code(), "VALIDATION");
}
