//! Quest progress calculation.
//!
//! Linked quests measure progress over their linked tasks; goals are carried
//! along for display but never count toward the percentage. Quantitative
//! quests measure a count against `target_count` over `period_days`.
//!
//! There is no completion feed for either kind yet, so unfinished quests are
//! estimated from their age through [`ProgressEstimator`]. The default
//! [`ElapsedTimeEstimator`] grows a fixed percentage per elapsed day and is an
//! approximation, not a measurement.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProgressConfig;
use crate::error::{Error, Result};
use crate::quest::{CountScope, Quest, QuestKind, QuestStatus};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Derived progress status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn from_percentage(percentage: i32) -> Self {
        if percentage <= 0 {
            ProgressStatus::NotStarted
        } else if percentage >= 100 {
            ProgressStatus::Completed
        } else {
            ProgressStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

/// Completed/total pair used for linked goals and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountProgress {
    pub completed: i64,
    pub total: i64,
}

/// Progress snapshot for one quest. Recomputed on demand, never stored.
///
/// Counts are signed so that externally supplied snapshots can be checked
/// with [`QuestProgress::is_valid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub percentage: i32,
    pub status: ProgressStatus,
    pub completed_count: i64,
    pub total_count: i64,
    pub remaining_count: i64,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    // Linked detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goals_progress: Option<CountProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_tasks_progress: Option<CountProgress>,

    // Quantitative detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_scope: Option<CountScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_rate: Option<f64>,
}

impl QuestProgress {
    fn base(percentage: i32, completed: i64, total: i64, now: DateTime<Utc>) -> Self {
        Self {
            percentage,
            status: ProgressStatus::from_percentage(percentage),
            completed_count: completed,
            total_count: total,
            remaining_count: total - completed,
            last_updated: now.to_rfc3339(),
            estimated_completion: None,
            error: None,
            linked_goals_progress: None,
            linked_tasks_progress: None,
            target_count: None,
            current_count: None,
            count_scope: None,
            period_days: None,
            progress_rate: None,
        }
    }

    /// Zero progress carrying an error message.
    pub fn degraded(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut progress = Self::base(0, 0, 0, now);
        progress.error = Some(message.into());
        progress
    }

    pub fn is_complete(&self) -> bool {
        self.status == ProgressStatus::Completed
    }

    /// Range, count and timestamp checks on a progress snapshot.
    pub fn is_valid(&self) -> bool {
        if !(0..=100).contains(&self.percentage) {
            return false;
        }
        if self.completed_count < 0 || self.total_count < 0 || self.remaining_count < 0 {
            return false;
        }
        is_parseable_date(&self.last_updated)
    }

    fn strip_rate(mut self) -> Self {
        self.progress_rate = None;
        self
    }
}

/// RFC 3339, or a zone-less ISO date / date-time.
fn is_parseable_date(raw: &str) -> bool {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

/// Validate an externally supplied progress object.
///
/// Objects that do not deserialize (for instance an unknown status) are
/// invalid.
pub fn validate_quest_progress(raw: &serde_json::Value) -> bool {
    serde_json::from_value::<QuestProgress>(raw.clone())
        .map(|progress| progress.is_valid())
        .unwrap_or(false)
}

/// Source of progress estimates for quests without a completion feed.
pub trait ProgressEstimator {
    /// Estimated percentage for an unfinished quest at `now`.
    fn estimate_percent(&self, quest: &Quest, now: DateTime<Utc>) -> f64;

    /// Days needed to reach 100% from `percent`, if the estimator can tell.
    fn days_to_complete(&self, percent: f64) -> Option<f64>;
}

/// Grows progress linearly with quest age, clamped below completion.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedTimeEstimator {
    daily_rate_percent: f64,
    max_percent: u32,
}

impl ElapsedTimeEstimator {
    pub fn new(daily_rate_percent: f64, max_percent: u32) -> Self {
        Self {
            daily_rate_percent,
            max_percent: max_percent.min(99),
        }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(config.daily_rate_percent, config.max_simulated_percent)
    }
}

impl Default for ElapsedTimeEstimator {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

impl ProgressEstimator for ElapsedTimeEstimator {
    fn estimate_percent(&self, quest: &Quest, now: DateTime<Utc>) -> f64 {
        let percent = elapsed_days(quest, now) * self.daily_rate_percent;
        percent.clamp(0.0, f64::from(self.max_percent))
    }

    fn days_to_complete(&self, percent: f64) -> Option<f64> {
        if self.daily_rate_percent <= 0.0 {
            return None;
        }
        Some((100.0 - percent).max(0.0) / self.daily_rate_percent)
    }
}

/// Days since `created_at`; zero when the clock is behind the quest.
pub fn elapsed_days(quest: &Quest, now: DateTime<Utc>) -> f64 {
    let millis = (now - quest.created_at).num_milliseconds().max(0);
    millis as f64 / MS_PER_DAY
}

/// Scale `total` by `percent`, keeping unfinished work strictly below `total`.
fn simulated_count(total: i64, percent: f64) -> i64 {
    if total <= 0 {
        return 0;
    }
    let scaled = (total as f64 * percent / 100.0).round() as i64;
    scaled.clamp(0, total - 1)
}

/// `start` plus a fractional day count; `None` past the representable range.
fn days_from(start: DateTime<Utc>, days: f64) -> Option<DateTime<Utc>> {
    let millis = days * MS_PER_DAY;
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64).and_then(|delta| start.checked_add_signed(delta))
}

/// End of a quantitative quest's period; `None` past the representable range.
fn period_end(created_at: DateTime<Utc>, period_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(period_days).and_then(|delta| created_at.checked_add_signed(delta))
}

/// Progress calculator parameterized by its estimator.
#[derive(Debug, Clone, Default)]
pub struct ProgressCalculator<E = ElapsedTimeEstimator> {
    estimator: E,
}

impl ProgressCalculator<ElapsedTimeEstimator> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::with_estimator(ElapsedTimeEstimator::from_config(config))
    }
}

impl<E: ProgressEstimator> ProgressCalculator<E> {
    pub fn with_estimator(estimator: E) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Progress of a linked quest over its linked tasks.
    pub fn linked(&self, quest: &Quest, now: DateTime<Utc>) -> Result<QuestProgress> {
        if quest.kind != QuestKind::Linked {
            return Err(Error::InvalidQuestKind {
                expected: QuestKind::Linked.to_string(),
                actual: quest.kind.to_string(),
            });
        }

        let total = quest.linked_task_ids.len() as i64;
        let goals_total = quest.linked_goal_ids.len() as i64;

        let (mut progress, goals_completed) = if quest.status == QuestStatus::Completed {
            (QuestProgress::base(100, total, total, now), goals_total)
        } else if total == 0 {
            (QuestProgress::base(0, 0, 0, now), 0)
        } else {
            let percent = self.estimator.estimate_percent(quest, now);
            let completed = simulated_count(total, percent);
            let mut progress = QuestProgress::base(percent.round() as i32, completed, total, now);
            progress.estimated_completion = self
                .estimator
                .days_to_complete(percent)
                .and_then(|days| days_from(now, days));
            (progress, simulated_count(goals_total, percent))
        };

        progress.linked_goals_progress = Some(CountProgress {
            completed: goals_completed,
            total: goals_total,
        });
        progress.linked_tasks_progress = Some(CountProgress {
            completed: progress.completed_count,
            total,
        });
        Ok(progress)
    }

    /// Progress of a quantitative quest against its target count.
    pub fn quantitative(&self, quest: &Quest, now: DateTime<Utc>) -> Result<QuestProgress> {
        if quest.kind != QuestKind::Quantitative {
            return Err(Error::InvalidQuestKind {
                expected: QuestKind::Quantitative.to_string(),
                actual: quest.kind.to_string(),
            });
        }

        let target = match quest.target_count {
            Some(target) if target > 0 => target,
            other => return Err(Error::InvalidTargetCount(other.unwrap_or(0))),
        };
        let scope = quest.count_scope.ok_or(Error::MissingCountScope)?;
        let period = match quest.period_days {
            Some(period) if period > 0 => period,
            other => return Err(Error::InvalidPeriod(other.unwrap_or(0))),
        };

        let mut progress = if quest.status == QuestStatus::Completed {
            QuestProgress::base(100, target, target, now)
        } else {
            let percent = self.estimator.estimate_percent(quest, now);
            QuestProgress::base(
                percent.round() as i32,
                simulated_count(target, percent),
                target,
                now,
            )
        };

        let elapsed = elapsed_days(quest, now).max(1.0);
        progress.target_count = Some(target);
        progress.current_count = Some(progress.completed_count);
        progress.count_scope = Some(scope);
        progress.period_days = Some(period);
        progress.progress_rate = Some(progress.completed_count as f64 / elapsed);
        if !progress.is_complete() {
            progress.estimated_completion = period_end(quest.created_at, period);
        }
        Ok(progress)
    }

    /// Dispatch on quest kind. Failures become a degraded snapshot with `error` set.
    pub fn quest_progress(&self, quest: &Quest, now: DateTime<Utc>) -> QuestProgress {
        self.dispatch(quest, now).strip_rate()
    }

    /// Like [`Self::quest_progress`], with the kind-specific fields always filled.
    pub fn detailed(&self, quest: &Quest, now: DateTime<Utc>) -> QuestProgress {
        let mut progress = self.dispatch(quest, now);
        if progress.error.is_none() {
            return progress;
        }

        match quest.kind {
            QuestKind::Linked => {
                progress.linked_goals_progress = Some(CountProgress {
                    completed: 0,
                    total: quest.linked_goal_ids.len() as i64,
                });
                progress.linked_tasks_progress = Some(CountProgress {
                    completed: 0,
                    total: quest.linked_task_ids.len() as i64,
                });
            }
            QuestKind::Quantitative => {
                progress.target_count = Some(quest.target_count.unwrap_or(0));
                progress.current_count = Some(0);
                progress.count_scope = quest.count_scope;
                progress.period_days = Some(quest.period_days.unwrap_or(0));
                progress.progress_rate = Some(0.0);
            }
            QuestKind::Other(_) => {}
        }
        progress
    }

    fn dispatch(&self, quest: &Quest, now: DateTime<Utc>) -> QuestProgress {
        let result = match &quest.kind {
            QuestKind::Linked => self.linked(quest, now),
            QuestKind::Quantitative => self.quantitative(quest, now),
            QuestKind::Other(kind) => Err(Error::UnsupportedQuestKind(kind.clone())),
        };

        match result {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(quest = %quest.id, error = %err, "progress calculation degraded");
                QuestProgress::degraded(err.to_string(), now)
            }
        }
    }
}

/// Linked-quest progress with the default estimator.
pub fn calculate_linked_quest_progress(quest: &Quest, now: DateTime<Utc>) -> Result<QuestProgress> {
    ProgressCalculator::new().linked(quest, now)
}

/// Quantitative-quest progress with the default estimator.
pub fn calculate_quantitative_quest_progress(
    quest: &Quest,
    now: DateTime<Utc>,
) -> Result<QuestProgress> {
    ProgressCalculator::new().quantitative(quest, now)
}

/// Progress for any quest; never fails, check `error` on the result.
pub fn calculate_quest_progress(quest: &Quest, now: DateTime<Utc>) -> QuestProgress {
    ProgressCalculator::new().quest_progress(quest, now)
}

/// Progress for any quest with kind-specific fields always present.
pub fn calculate_detailed_quest_progress(quest: &Quest, now: DateTime<Utc>) -> QuestProgress {
    ProgressCalculator::new().detailed(quest, now)
}
