//! Notification policy for quest events.
//!
//! - [`should_notify`] gates in-app toasts on the user's preferences
//! - [`get_notification_message`] renders a toast from translation templates
//! - [`detect_quest_changes`] / [`QuestChangeTracker`] turn quest snapshots into events
//! - [`QuestNotifier`] ties a profile source and a sink together

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::quest::Quest;

mod changes;
mod notifier;

pub use changes::{detect_quest_changes, QuestChangeTracker};
pub use notifier::{
    FileProfileSource, MemorySink, NotificationSink, ProfileSource, QuestNotifier, Toast,
    UserProfile,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannels {
    #[serde(default)]
    pub in_app: bool,
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub push: bool,
}

/// Per-user notification toggles. Missing toggles read as off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default)]
    pub quest_started: bool,
    #[serde(default)]
    pub quest_completed: bool,
    #[serde(default)]
    pub quest_failed: bool,
    #[serde(default)]
    pub progress_milestones: bool,
    #[serde(default)]
    pub deadline_warnings: bool,
    #[serde(default)]
    pub streak_achievements: bool,
    #[serde(default)]
    pub challenge_updates: bool,
    #[serde(default)]
    pub channels: NotificationChannels,
}

impl NotificationPreferences {
    /// Everything on, in-app channel only.
    pub fn all_in_app() -> Self {
        Self {
            quest_started: true,
            quest_completed: true,
            quest_failed: true,
            progress_milestones: true,
            deadline_warnings: true,
            streak_achievements: true,
            challenge_updates: true,
            channels: NotificationChannels {
                in_app: true,
                email: false,
                push: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEventType {
    QuestStarted,
    QuestCompleted,
    QuestFailed,
    ProgressMilestone,
    DeadlineWarning,
    StreakAchieved,
    ChallengeJoined,
}

impl NotificationEventType {
    pub const ALL: [NotificationEventType; 7] = [
        NotificationEventType::QuestStarted,
        NotificationEventType::QuestCompleted,
        NotificationEventType::QuestFailed,
        NotificationEventType::ProgressMilestone,
        NotificationEventType::DeadlineWarning,
        NotificationEventType::StreakAchieved,
        NotificationEventType::ChallengeJoined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEventType::QuestStarted => "questStarted",
            NotificationEventType::QuestCompleted => "questCompleted",
            NotificationEventType::QuestFailed => "questFailed",
            NotificationEventType::ProgressMilestone => "progressMilestone",
            NotificationEventType::DeadlineWarning => "deadlineWarning",
            NotificationEventType::StreakAchieved => "streakAchieved",
            NotificationEventType::ChallengeJoined => "challengeJoined",
        }
    }

    /// The preference toggle governing this event type.
    pub fn preference_enabled(&self, preferences: &NotificationPreferences) -> bool {
        match self {
            NotificationEventType::QuestStarted => preferences.quest_started,
            NotificationEventType::QuestCompleted => preferences.quest_completed,
            NotificationEventType::QuestFailed => preferences.quest_failed,
            NotificationEventType::ProgressMilestone => preferences.progress_milestones,
            NotificationEventType::DeadlineWarning => preferences.deadline_warnings,
            NotificationEventType::StreakAchieved => preferences.streak_achievements,
            NotificationEventType::ChallengeJoined => preferences.challenge_updates,
        }
    }

    fn fallback_template(&self) -> &'static str {
        match self {
            NotificationEventType::QuestStarted => "Quest \"{title}\" started! Good luck!",
            NotificationEventType::QuestCompleted => {
                "Congratulations! Quest \"{title}\" completed!"
            }
            NotificationEventType::QuestFailed => "Quest \"{title}\" has failed. Don't give up!",
            NotificationEventType::ProgressMilestone => {
                "Quest \"{title}\" is {percentage}% complete!"
            }
            NotificationEventType::DeadlineWarning => "Quest \"{title}\" is due in {days} day(s)",
            NotificationEventType::StreakAchieved => "Amazing! You reached a {days}-day streak!",
            NotificationEventType::ChallengeJoined => "You joined the challenge \"{title}\"",
        }
    }
}

impl fmt::Display for NotificationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationEventType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == trimmed)
            .ok_or_else(|| {
                Error::InvalidArgument(format!("unknown notification event type '{trimmed}'"))
            })
    }
}

/// Values substituted into message templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: NotificationEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest: Option<Quest>,
    #[serde(default)]
    pub data: NotificationData,
}

impl NotificationEvent {
    pub fn new(event_type: NotificationEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            event_type,
            timestamp,
            quest: None,
            data: NotificationData::default(),
        }
    }

    pub fn for_quest(event_type: NotificationEventType, quest: &Quest, now: DateTime<Utc>) -> Self {
        let mut event = Self::new(event_type, now);
        event.quest = Some(quest.clone());
        event
    }

    pub fn with_percentage(mut self, percentage: u32) -> Self {
        self.data.percentage = Some(percentage);
        self
    }

    pub fn with_days(mut self, days: i64) -> Self {
        self.data.days = Some(days);
        self
    }

    pub fn quest_id(&self) -> Option<&str> {
        self.quest.as_ref().map(|quest| quest.id.as_str())
    }
}

/// Whether an in-app toast should be shown for `event_type`.
///
/// Requires both the event's toggle and the in-app channel. Email and push are
/// delivered elsewhere and not consulted.
pub fn should_notify(
    event_type: NotificationEventType,
    preferences: Option<&NotificationPreferences>,
) -> bool {
    match preferences {
        Some(preferences) => {
            event_type.preference_enabled(preferences) && preferences.channels.in_app
        }
        None => false,
    }
}

/// Render the toast text for `event`.
///
/// Templates come from `translations.quest.notifications.messages.<type>`;
/// any missing level falls back to built-in English.
pub fn get_notification_message(
    event: &NotificationEvent,
    translations: Option<&serde_json::Value>,
) -> String {
    let pointer = format!("/quest/notifications/messages/{}", event.event_type.as_str());
    let template = translations
        .and_then(|table| table.pointer(&pointer))
        .and_then(|value| value.as_str())
        .unwrap_or_else(|| event.event_type.fallback_template());

    let mut message = template.to_string();
    if let Some(quest) = &event.quest {
        message = message.replace("{title}", &quest.title);
    }
    if let Some(percentage) = event.data.percentage {
        message = message.replace("{percentage}", &percentage.to_string());
    }
    if let Some(days) = event.data.days {
        message = message.replace("{days}", &days.to_string());
    }
    message
}
