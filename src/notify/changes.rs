use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{NotificationEvent, NotificationEventType};
use crate::config::NotifyConfig;
use crate::quest::{Quest, QuestStatus};

const MS_PER_DAY: i64 = 86_400_000;

/// Diff two quest snapshots by id into notification events.
///
/// Stateless: a quest sitting inside the deadline window produces a warning
/// on every call. Use [`QuestChangeTracker`] to warn once per deadline.
pub fn detect_quest_changes(
    previous: &[Quest],
    current: &[Quest],
    now: DateTime<Utc>,
    config: &NotifyConfig,
) -> Vec<NotificationEvent> {
    let previous_by_id: HashMap<&str, &Quest> = previous
        .iter()
        .map(|quest| (quest.id.as_str(), quest))
        .collect();

    let mut events = Vec::new();
    for quest in current {
        match previous_by_id.get(quest.id.as_str()) {
            None => {
                if quest.is_active() {
                    events.push(NotificationEvent::for_quest(
                        NotificationEventType::QuestStarted,
                        quest,
                        now,
                    ));
                }
            }
            Some(old) if old.status != quest.status => {
                if let Some(event) = status_change_event(old, quest, now) {
                    events.push(event);
                }
            }
            Some(old) => {
                if quest.is_active() {
                    if let Some(event) = milestone_event(old, quest, now, &config.milestones) {
                        events.push(event);
                    }
                }
            }
        }

        if let Some(event) = deadline_event(quest, now, config.deadline_window_hours) {
            events.push(event);
        }
    }
    events
}

fn status_change_event(old: &Quest, quest: &Quest, now: DateTime<Utc>) -> Option<NotificationEvent> {
    if !old.status.can_transition_to(quest.status) {
        tracing::warn!(
            quest = %quest.id,
            from = %old.status,
            to = %quest.status,
            "unexpected quest status transition"
        );
    }

    let event_type = match (old.status, quest.status) {
        (_, QuestStatus::Completed) => NotificationEventType::QuestCompleted,
        (_, QuestStatus::Failed) => NotificationEventType::QuestFailed,
        (QuestStatus::Draft, QuestStatus::Active) => NotificationEventType::QuestStarted,
        _ => return None,
    };
    Some(NotificationEvent::for_quest(event_type, quest, now))
}

/// First milestone crossed between the two reported percentages, if any.
fn milestone_event(
    old: &Quest,
    quest: &Quest,
    now: DateTime<Utc>,
    milestones: &[u32],
) -> Option<NotificationEvent> {
    let before = old.progress.unwrap_or(0);
    let after = quest.progress?;
    let crossed = milestones
        .iter()
        .copied()
        .find(|&milestone| before < milestone && milestone <= after)?;
    Some(
        NotificationEvent::for_quest(NotificationEventType::ProgressMilestone, quest, now)
            .with_percentage(crossed),
    )
}

fn deadline_event(quest: &Quest, now: DateTime<Utc>, window_hours: u32) -> Option<NotificationEvent> {
    if !quest.is_active() {
        return None;
    }
    let deadline = quest.deadline?;
    let remaining = deadline - now;
    if remaining <= Duration::zero() || remaining > Duration::hours(i64::from(window_hours)) {
        return None;
    }

    let millis = remaining.num_milliseconds();
    let days = (millis + MS_PER_DAY - 1) / MS_PER_DAY;
    Some(
        NotificationEvent::for_quest(NotificationEventType::DeadlineWarning, quest, now)
            .with_days(days),
    )
}

/// Stateful change detection with per-quest deadline watermarks.
///
/// Keeps the last observed snapshot and, for each quest, the deadline it was
/// last warned about. A warning is emitted again only if the deadline moves.
#[derive(Debug, Clone, Default)]
pub struct QuestChangeTracker {
    config: NotifyConfig,
    previous: Vec<Quest>,
    warned: HashMap<String, DateTime<Utc>>,
}

impl QuestChangeTracker {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            previous: Vec::new(),
            warned: HashMap::new(),
        }
    }

    /// Start from a known snapshot so its quests are not reported as new.
    pub fn with_baseline(config: NotifyConfig, baseline: Vec<Quest>) -> Self {
        Self {
            previous: baseline,
            ..Self::new(config)
        }
    }

    pub fn snapshot(&self) -> &[Quest] {
        &self.previous
    }

    /// Last warned deadline for a quest
    pub fn warned_deadline(&self, quest_id: &str) -> Option<DateTime<Utc>> {
        self.warned.get(quest_id).copied()
    }

    /// Diff `current` against the stored snapshot, then adopt it.
    pub fn observe(&mut self, current: Vec<Quest>, now: DateTime<Utc>) -> Vec<NotificationEvent> {
        let mut events = detect_quest_changes(&self.previous, &current, now, &self.config);

        if self.config.dedupe_deadline_warnings {
            let warned = &mut self.warned;
            events.retain(|event| {
                if event.event_type != NotificationEventType::DeadlineWarning {
                    return true;
                }
                let Some(quest) = &event.quest else {
                    return true;
                };
                let Some(deadline) = quest.deadline else {
                    return true;
                };
                if warned.get(&quest.id) == Some(&deadline) {
                    tracing::debug!(quest = %quest.id, "deadline warning already sent");
                    return false;
                }
                warned.insert(quest.id.clone(), deadline);
                true
            });

            self.warned.retain(|id, deadline| {
                current.iter().any(|quest| {
                    &quest.id == id
                        && quest.is_active()
                        && quest.deadline == Some(*deadline)
                        && *deadline > now
                })
            });
        }

        self.previous = current;
        events
    }

    /// Forget the snapshot and all watermarks.
    pub fn reset(&mut self) {
        self.previous.clear();
        self.warned.clear();
    }
}
