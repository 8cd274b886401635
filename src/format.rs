//! Display helpers for progress snapshots.

use chrono::{DateTime, Utc};

use crate::progress::ProgressStatus;

/// Round half up to a whole percentage: `50.5` -> `"51%"`.
pub fn format_progress_percentage(percentage: f64) -> String {
    format!("{}%", (percentage + 0.5).floor() as i64)
}

pub fn format_remaining_count(remaining: i64) -> String {
    if remaining <= 0 {
        "Complete".to_string()
    } else {
        format!("{remaining} remaining")
    }
}

/// Relative label for an estimated completion date, by calendar day.
pub fn format_estimated_completion(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (date.date_naive() - now.date_naive()).num_days();
    match days {
        d if d < 0 => "Overdue".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d => format!("In {d} days"),
    }
}

pub fn progress_status_color(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::Completed => "text-green-600",
        ProgressStatus::InProgress => "text-blue-600",
        ProgressStatus::NotStarted => "text-gray-500",
    }
}

pub fn progress_status_icon(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::Completed => "✓",
        ProgressStatus::InProgress => "⏳",
        ProgressStatus::NotStarted => "○",
    }
}
