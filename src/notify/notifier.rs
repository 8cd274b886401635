use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    get_notification_message, should_notify, NotificationEvent, NotificationEventType,
    NotificationPreferences,
};
use crate::error::{Error, Result};

/// The slice of a user profile this crate reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Where the notifier gets the current user's profile.
pub trait ProfileSource {
    fn fetch_profile(&self) -> Result<UserProfile>;
}

/// Reads a profile JSON document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileProfileSource {
    path: PathBuf,
}

impl FileProfileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileSource for FileProfileSource {
    fn fetch_profile(&self) -> Result<UserProfile> {
        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::ProfileUnavailable(format!("{}: {err}", self.path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|err| Error::ProfileUnavailable(format!("{}: {err}", self.path.display())))
    }
}

impl ProfileSource for UserProfile {
    fn fetch_profile(&self) -> Result<UserProfile> {
        Ok(self.clone())
    }
}

/// A rendered in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub event_type: NotificationEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quest_id: Option<String>,
    pub message: String,
}

/// Displays toasts.
pub trait NotificationSink {
    fn show(&mut self, toast: &Toast, event: &NotificationEvent) -> Result<()>;
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn show(&mut self, toast: &Toast, event: &NotificationEvent) -> Result<()> {
        (**self).show(toast, event)
    }
}

/// Collects toasts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub toasts: Vec<Toast>,
}

impl NotificationSink for MemorySink {
    fn show(&mut self, toast: &Toast, _event: &NotificationEvent) -> Result<()> {
        self.toasts.push(toast.clone());
        Ok(())
    }
}

/// Shows toasts for quest events the user has opted into.
pub struct QuestNotifier<P, S> {
    profiles: P,
    sink: S,
    translations: Option<serde_json::Value>,
}

impl<P: ProfileSource, S: NotificationSink> QuestNotifier<P, S> {
    pub fn new(profiles: P, sink: S) -> Self {
        Self {
            profiles,
            sink,
            translations: None,
        }
    }

    pub fn with_translations(mut self, translations: serde_json::Value) -> Self {
        self.translations = Some(translations);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Show a toast for `event` if preferences allow it.
    ///
    /// A failed profile fetch skips the notification; there is no retry.
    /// Returns whether a toast was shown.
    pub fn notify(&mut self, event: &NotificationEvent) -> Result<bool> {
        let profile = match self.profiles.fetch_profile() {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(event = %event.event_type, error = %err, "skipping notification");
                return Ok(false);
            }
        };

        if !should_notify(event.event_type, profile.notification_preferences.as_ref()) {
            tracing::debug!(event = %event.event_type, "notification disabled by preferences");
            return Ok(false);
        }

        let toast = Toast {
            event_type: event.event_type,
            quest_id: event.quest_id().map(str::to_string),
            message: get_notification_message(event, self.translations.as_ref()),
        };
        self.sink.show(&toast, event)?;
        Ok(true)
    }

    /// Notify each event in order, returning how many toasts were shown.
    pub fn notify_all(&mut self, events: &[NotificationEvent]) -> Result<usize> {
        let mut shown = 0;
        for event in events {
            if self.notify(event)? {
                shown += 1;
            }
        }
        Ok(shown)
    }
}
