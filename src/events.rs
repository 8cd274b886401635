//! Toast output as JSON lines.
//!
//! The CLI has no toast surface, so notifications are written as JSONL to
//! stdout or an append-only file for whatever renders them.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::notify::{
    NotificationData, NotificationEvent, NotificationEventType, NotificationSink, Toast,
};

pub const EVENT_SCHEMA_VERSION: &str = "ggq.event.v1";

#[derive(Debug, Clone)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::stdout()),
            EventDestination::File(path) => EventSink::file(path),
        }
    }
}

/// One shown notification, as written to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct ToastRecord<'a> {
    pub schema_version: &'static str,
    pub event_id: &'a str,
    pub event: NotificationEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quest_id: Option<&'a str>,
    pub message: &'a str,
    pub data: &'a NotificationData,
}

/// Writes toasts as JSONL to a destination.
pub struct EventSink {
    writer: Box<dyn Write + Send>,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }

    /// Write a single record as JSONL.
    pub fn emit<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let serialized = serde_json::to_vec(record)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}

impl NotificationSink for EventSink {
    fn show(&mut self, toast: &Toast, event: &NotificationEvent) -> Result<()> {
        self.emit(&ToastRecord {
            schema_version: EVENT_SCHEMA_VERSION,
            event_id: &event.event_id,
            event: toast.event_type,
            timestamp: event.timestamp,
            quest_id: toast.quest_id.as_deref(),
            message: &toast.message,
            data: &event.data,
        })
    }
}
