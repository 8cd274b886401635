//! Quest records as read by the progress, notification and filter layers.
//!
//! Quests arrive as camelCase JSON with epoch-millisecond timestamps. Nothing
//! in this crate mutates a quest once loaded.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a quest measures its progress.
///
/// Unknown kinds are preserved verbatim so the dispatcher can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestKind {
    Linked,
    Quantitative,
    Other(String),
}

impl QuestKind {
    pub fn as_str(&self) -> &str {
        match self {
            QuestKind::Linked => "linked",
            QuestKind::Quantitative => "quantitative",
            QuestKind::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for QuestKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "linked" => QuestKind::Linked,
            "quantitative" => QuestKind::Quantitative,
            _ => QuestKind::Other(raw),
        }
    }
}

impl From<QuestKind> for String {
    fn from(kind: QuestKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for QuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quest lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Draft,
    Active,
    Completed,
    Failed,
    Archived,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Draft => "draft",
            QuestStatus::Active => "active",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
            QuestStatus::Archived => "archived",
        }
    }

    /// Whether `next` is a legal forward move: draft -> active -> {completed|failed} -> archived.
    pub fn can_transition_to(&self, next: QuestStatus) -> bool {
        matches!(
            (self, next),
            (QuestStatus::Draft, QuestStatus::Active)
                | (QuestStatus::Active, QuestStatus::Completed)
                | (QuestStatus::Active, QuestStatus::Failed)
                | (QuestStatus::Completed, QuestStatus::Archived)
                | (QuestStatus::Failed, QuestStatus::Archived)
        )
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "draft" => Ok(QuestStatus::Draft),
            "active" => Ok(QuestStatus::Active),
            "completed" => Ok(QuestStatus::Completed),
            "failed" => Ok(QuestStatus::Failed),
            "archived" => Ok(QuestStatus::Archived),
            other => Err(Error::InvalidArgument(format!(
                "unknown quest status '{other}' (expected draft|active|completed|failed|archived)"
            ))),
        }
    }
}

/// What a quantitative quest counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountScope {
    CompletedTasks,
    CompletedGoals,
    Any,
}

impl CountScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountScope::CompletedTasks => "completed_tasks",
            CountScope::CompletedGoals => "completed_goals",
            CountScope::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub kind: QuestKind,
    pub status: QuestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub linked_goal_ids: Vec<String>,
    #[serde(default)]
    pub linked_task_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_scope: Option<CountScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_days: Option<i64>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<DateTime<Utc>>,
    /// Last progress percentage reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Quest {
    /// Build a bare quest with no links, targets or filter metadata.
    pub fn new(
        id: impl Into<String>,
        kind: QuestKind,
        status: QuestStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            kind,
            status,
            difficulty: None,
            category: None,
            linked_goal_ids: Vec::new(),
            linked_task_ids: Vec::new(),
            target_count: None,
            count_scope: None,
            period_days: None,
            deadline: None,
            progress: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestDocument {
    Many(Vec<Quest>),
    One(Box<Quest>),
}

/// Parse a JSON document holding either a quest array or a single quest.
pub fn parse_quests(content: &str) -> Result<Vec<Quest>> {
    let document: QuestDocument = serde_json::from_str(content)?;
    Ok(match document {
        QuestDocument::Many(quests) => quests,
        QuestDocument::One(quest) => vec![*quest],
    })
}

/// Load quests from a JSON file.
pub fn load_quests(path: &Path) -> Result<Vec<Quest>> {
    let content = std::fs::read_to_string(path)?;
    parse_quests(&content)
}
