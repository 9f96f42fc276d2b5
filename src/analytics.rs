//! Mood summaries for the rolling window shown on the mood screen.

use crate::models::{Mood, MoodSample, MoodSummary};
use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeMap;

/// Window the mood screen summarizes unless configured otherwise.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const VARIED_MESSAGE: &str = "Your moods are varied. Keep monitoring and take care of your mental health.";

/// Share a single mood must strictly exceed to get its own message.
const DOMINANT_SHARE: f64 = 50.0;

fn dominant_message(mood: Mood) -> &'static str {
    match mood {
        Mood::Great => "You've been feeling great! Keep up the positive vibes.",
        Mood::Good => "Your moods are mostly positive. Stay happy!",
        Mood::Neutral => "You're maintaining a balanced state. Remember to take breaks.",
        Mood::Sad => "You've been feeling down lately. Consider reaching out to a friend or professional.",
        Mood::Awful => "It seems you're going through a tough time. Take care of yourself.",
    }
}

pub fn mood_counts(samples: &[MoodSample]) -> BTreeMap<Mood, usize> {
    let mut counts = BTreeMap::new();
    for sample in samples {
        *counts.entry(sample.mood).or_insert(0) += 1;
    }
    counts
}

/// Percentage of samples per mood present. Empty input gives an empty map.
pub fn mood_percentages(samples: &[MoodSample]) -> BTreeMap<Mood, f64> {
    let total = samples.len();
    if total == 0 {
        return BTreeMap::new();
    }
    mood_counts(samples)
        .into_iter()
        .map(|(mood, count)| (mood, count as f64 / total as f64 * 100.0))
        .collect()
}

/// The mood with the highest count. On a tie the earliest mood in
/// [`Mood::ALL`] order wins; callers should not rely on which.
pub fn most_frequent(samples: &[MoodSample]) -> Option<Mood> {
    let mut best: Option<(Mood, usize)> = None;
    for (mood, count) in mood_counts(samples) {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((mood, count));
        }
    }
    best.map(|(mood, _)| mood)
}

pub fn no_data_message(window_days: i64) -> String {
    match window_days {
        1 => "No mood data available for the past day.".to_string(),
        days => format!("No mood data available for the past {} days.", days),
    }
}

pub fn summary_message(percentages: &BTreeMap<Mood, f64>, window_days: i64) -> String {
    if percentages.is_empty() {
        return no_data_message(window_days);
    }
    Mood::ALL
        .iter()
        .find(|mood| percentages.get(*mood).copied().unwrap_or(0.0) > DOMINANT_SHARE)
        .map_or(VARIED_MESSAGE, |mood| dominant_message(*mood))
        .to_string()
}

/// Summary of samples already cut to the default seven-day window.
pub fn summarize(samples: &[MoodSample]) -> MoodSummary {
    summarize_window(samples, DEFAULT_WINDOW_DAYS)
}

/// Summary of samples cut to a `window_days` window. The window only shapes
/// the message shown when there is no data.
pub fn summarize_window(samples: &[MoodSample], window_days: i64) -> MoodSummary {
    let percentages = mood_percentages(samples);
    let message = summary_message(&percentages, window_days);
    MoodSummary {
        most_frequent: most_frequent(samples),
        percentages,
        message,
    }
}

/// Samples whose local calendar date falls fewer than `days` days before
/// `today`. Samples dated after `today` are kept.
pub fn within_calendar_days(samples: &[MoodSample], today: NaiveDate, days: i64) -> Vec<MoodSample> {
    samples
        .iter()
        .filter(|sample| {
            DateTime::from_timestamp_millis(sample.logged_at)
                .map(|logged| logged.with_timezone(&Local).date_naive())
                .map_or(false, |date| (today - date).num_days() < days)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        most_frequent, mood_percentages, summarize, summarize_window, summary_message, within_calendar_days,
        VARIED_MESSAGE,
    };
    use crate::models::{Mood, MoodSample};
    use chrono::{Duration, Local, TimeZone};
    use std::collections::BTreeMap;

    fn sample(mood: Mood, logged_at: i64) -> MoodSample {
        MoodSample {
            id: logged_at,
            mood,
            note: String::new(),
            answers: Default::default(),
            logged_at,
        }
    }

    fn samples(moods: &[(Mood, usize)]) -> Vec<MoodSample> {
        moods
            .iter()
            .flat_map(|(mood, count)| std::iter::repeat(*mood).take(*count))
            .enumerate()
            .map(|(index, mood)| sample(mood, index as i64))
            .collect()
    }

    #[test]
    fn six_great_one_neutral_is_mostly_great() {
        let input = samples(&[(Mood::Great, 6), (Mood::Neutral, 1)]);
        let summary = summarize(&input);

        assert_eq!(summary.percentages.len(), 2);
        assert!((summary.percentages[&Mood::Great] - 85.714_285).abs() < 1e-3);
        assert!((summary.percentages[&Mood::Neutral] - 14.285_714).abs() < 1e-3);
        assert_eq!(summary.most_frequent, Some(Mood::Great));
        assert_eq!(summary.message, "You've been feeling great! Keep up the positive vibes.");
    }

    #[test]
    fn empty_input_has_no_distribution() {
        let summary = summarize(&[]);
        assert!(summary.percentages.is_empty());
        assert_eq!(summary.most_frequent, None);
        assert_eq!(summary.message, "No mood data available for the past 7 days.");
    }

    #[test]
    fn empty_message_names_the_configured_window() {
        assert_eq!(
            summarize_window(&[], 14).message,
            "No mood data available for the past 14 days."
        );
        assert_eq!(summarize_window(&[], 1).message, "No mood data available for the past day.");

        let input = samples(&[(Mood::Good, 2)]);
        assert_eq!(summarize_window(&input, 30).message, summarize(&input).message);
    }

    #[test]
    fn exactly_half_is_not_dominant() {
        let input = samples(&[(Mood::Sad, 2), (Mood::Good, 2)]);
        assert_eq!(summarize(&input).message, VARIED_MESSAGE);

        let mut percentages = BTreeMap::new();
        percentages.insert(Mood::Awful, 50.000_1);
        percentages.insert(Mood::Good, 49.999_9);
        assert_eq!(
            summary_message(&percentages, 7),
            "It seems you're going through a tough time. Take care of yourself."
        );
    }

    #[test]
    fn every_mood_has_its_own_dominant_message() {
        let messages: Vec<String> = Mood::ALL
            .iter()
            .map(|mood| summary_message(&mood_percentages(&samples(&[(*mood, 3)])), 7))
            .collect();
        for (index, message) in messages.iter().enumerate() {
            assert_ne!(message, VARIED_MESSAGE);
            assert!(!messages[index + 1..].contains(message));
        }
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let input = samples(&[(Mood::Great, 1), (Mood::Good, 2), (Mood::Sad, 4)]);
        let total: f64 = mood_percentages(&input).values().sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_resolve_to_the_earlier_mood() {
        let input = samples(&[(Mood::Sad, 3), (Mood::Good, 3)]);
        assert_eq!(most_frequent(&input), Some(Mood::Good));
    }

    #[test]
    fn calendar_window_counts_today_and_six_previous_days() {
        let now = Local.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let today = now.date_naive();
        let at = |offset: Duration| (now - offset).timestamp_millis();

        let input = vec![
            sample(Mood::Great, at(Duration::zero())),
            sample(Mood::Good, at(Duration::days(6))),
            sample(Mood::Sad, at(Duration::days(7))),
        ];

        let kept: Vec<Mood> = within_calendar_days(&input, today, 7)
            .iter()
            .map(|sample| sample.mood)
            .collect();
        assert_eq!(kept, vec![Mood::Great, Mood::Good]);
    }
}
