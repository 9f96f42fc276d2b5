use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of fixed questions answered with every mood sample.
pub const MOOD_QUESTION_COUNT: usize = 7;

/// Stored in place of an answer that was never recorded.
pub const MISSING_ANSWER: &str = "N/A";

pub const MOOD_QUESTIONS: [&str; MOOD_QUESTION_COUNT] = [
    "How would you describe your emotional state today?",
    "Do you feel overwhelmed or at ease with your responsibilities?",
    "How restful was your sleep last night?",
    "What level of energy do you feel right now?",
    "How motivated do you feel to work toward your goals?",
    "Did anything make you feel particularly happy or sad today?",
    "Are you able to focus and concentrate on tasks today?",
];

pub const ANSWER_OPTIONS: [&str; 5] = ["Very Low", "Low", "Moderate", "High", "Very High"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "😀")]
    Great,
    #[serde(rename = "🙂")]
    Good,
    #[serde(rename = "😐")]
    Neutral,
    #[serde(rename = "☹️")]
    Sad,
    #[serde(rename = "😭")]
    Awful,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Self::Great, Self::Good, Self::Neutral, Self::Sad, Self::Awful];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Great => "😀",
            Self::Good => "🙂",
            Self::Neutral => "😐",
            Self::Sad => "\u{2639}\u{fe0f}",
            Self::Awful => "😭",
        }
    }

    /// Accepts the marker itself or its lowercase name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "😀" | "great" => Some(Self::Great),
            "🙂" | "good" => Some(Self::Good),
            "😐" | "neutral" => Some(Self::Neutral),
            "\u{2639}\u{fe0f}" | "\u{2639}" | "sad" => Some(Self::Sad),
            "😭" | "awful" => Some(Self::Awful),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
    pub favorited: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSample {
    pub id: i64,
    pub mood: Mood,
    pub note: String,
    pub answers: [String; MOOD_QUESTION_COUNT],
    /// Epoch milliseconds.
    pub logged_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub percentages: BTreeMap<Mood, f64>,
    pub most_frequent: Option<Mood>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySteps {
    /// Local calendar day, `YYYY-MM-DD`.
    pub day: String,
    pub steps: i64,
    pub calories: Option<i64>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessSummary {
    pub steps: i64,
    pub goal: i64,
    pub calories: i64,
    pub distance_km: f64,
    /// Fraction of the goal reached, clamped to `[0, 1]`.
    pub progress: f64,
}

/// How a cumulative since-boot sensor total becomes "steps today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DayBoundaryPolicy {
    /// Report the sensor total unchanged.
    #[default]
    Passthrough,
    /// Subtract the first reading seen on the current local day.
    BaselineSubtraction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub default_step_goal: i64,
    pub mood_window_days: i64,
    pub day_boundary_policy: DayBoundaryPolicy,
    pub calories_per_step: f64,
    pub km_per_step: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_step_goal: 10_000,
            mood_window_days: 7,
            day_boundary_policy: DayBoundaryPolicy::Passthrough,
            calories_per_step: 0.04,
            km_per_step: 0.000_762,
        }
    }
}
