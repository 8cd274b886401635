//! ggq notify command implementation
//!
//! `check` answers the preference question for one event type; `diff` runs
//! change detection over two snapshots and optionally delivers the toasts.

use std::path::PathBuf;

use serde::Serialize;

use super::{read_json_file, CommandContext};
use crate::error::Result;
use crate::events::EventDestination;
use crate::notify::{
    detect_quest_changes, get_notification_message, should_notify, FileProfileSource,
    MemorySink, NotificationEventType, NotificationSink, ProfileSource, QuestNotifier,
};
use crate::output::{emit, Report, TextReport};
use crate::quest::load_quests;

/// Options for `ggq notify check`
pub struct CheckOptions {
    pub event: String,
    pub profile: PathBuf,
}

/// Options for `ggq notify diff`
pub struct DiffOptions {
    pub previous: PathBuf,
    pub current: PathBuf,
    pub profile: Option<PathBuf>,
    pub translations: Option<PathBuf>,
    pub events: Option<String>,
}

#[derive(Serialize)]
struct CheckReport {
    event: NotificationEventType,
    notify: bool,
    preference: bool,
    in_app: bool,
    #[serde(skip)]
    has_preferences: bool,
}

impl Report for CheckReport {
    fn command(&self) -> &'static str {
        "notify check"
    }

    fn render(&self, text: &mut TextReport) {
        let verdict = if self.notify { "show" } else { "skip" };
        text.title(format!("ggq notify check: {} -> {verdict}", self.event))
            .fact("preference", on_off(self.preference))
            .fact("in-app channel", on_off(self.in_app));
        if !self.has_preferences {
            text.warn("profile has no notificationPreferences");
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[derive(Serialize)]
struct DiffEntry {
    event: NotificationEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    quest_id: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shown: Option<bool>,
}

#[derive(Serialize)]
struct DiffReport {
    events: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shown: Option<usize>,
}

impl Report for DiffReport {
    fn command(&self) -> &'static str {
        "notify diff"
    }

    fn render(&self, text: &mut TextReport) {
        text.title(format!("ggq notify diff: {} event(s)", self.events.len()));
        if let Some(shown) = self.shown {
            text.fact("shown", shown)
                .fact("skipped", self.events.len() - shown);
        }
        for entry in &self.events {
            let marker = match entry.shown {
                Some(true) => "[shown] ",
                Some(false) => "[skipped] ",
                None => "",
            };
            text.row(format!("{marker}{}: {}", entry.event, entry.message));
        }
    }
}

pub fn run_check(ctx: &CommandContext, options: CheckOptions) -> Result<()> {
    let event: NotificationEventType = options.event.parse()?;
    let profile = FileProfileSource::new(&options.profile).fetch_profile()?;
    let preferences = profile.notification_preferences;

    let report = CheckReport {
        event,
        notify: should_notify(event, preferences.as_ref()),
        preference: preferences
            .as_ref()
            .map(|prefs| event.preference_enabled(prefs))
            .unwrap_or(false),
        in_app: preferences
            .as_ref()
            .map(|prefs| prefs.channels.in_app)
            .unwrap_or(false),
        has_preferences: preferences.is_some(),
    };

    emit(ctx.output, &report)
}

pub fn run_diff(ctx: &CommandContext, options: DiffOptions) -> Result<()> {
    let previous = load_quests(&options.previous)?;
    let current = load_quests(&options.current)?;
    let translations = options
        .translations
        .as_deref()
        .map(read_json_file)
        .transpose()?;

    let events = detect_quest_changes(&previous, &current, ctx.now, &ctx.config.notifications);

    let mut entries: Vec<DiffEntry> = events
        .iter()
        .map(|event| DiffEntry {
            event: event.event_type,
            quest_id: event.quest_id().map(str::to_string),
            message: get_notification_message(event, translations.as_ref()),
            shown: None,
        })
        .collect();

    let mut shown_total = None;
    if let Some(profile) = options.profile.as_ref() {
        let sink: Box<dyn NotificationSink> =
            match EventDestination::parse(options.events.as_deref()) {
                Some(destination) => Box::new(destination.open()?),
                None => Box::new(MemorySink::default()),
            };
        let mut notifier = QuestNotifier::new(FileProfileSource::new(profile), sink);
        if let Some(translations) = translations.clone() {
            notifier = notifier.with_translations(translations);
        }

        let mut shown = 0;
        for (event, entry) in events.iter().zip(entries.iter_mut()) {
            let was_shown = notifier.notify(event)?;
            if was_shown {
                shown += 1;
            }
            entry.shown = Some(was_shown);
        }
        shown_total = Some(shown);
    }

    emit(
        ctx.output,
        &DiffReport {
            events: entries,
            shown: shown_total,
        },
    )
}
