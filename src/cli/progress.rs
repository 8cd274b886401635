//! ggq progress command implementation

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CommandContext;
use crate::error::{Error, Result};
use crate::format::{
    format_estimated_completion, format_progress_percentage, format_remaining_count,
    progress_status_icon,
};
use crate::output::{emit, Report, TextReport};
use crate::progress::{ProgressCalculator, QuestProgress};
use crate::quest::load_quests;

/// Options for `ggq progress`
pub struct ProgressOptions {
    pub quests: PathBuf,
    pub detailed: bool,
    pub id: Option<String>,
}

#[derive(Serialize)]
struct ProgressEntry {
    id: String,
    title: String,
    kind: String,
    progress: QuestProgress,
}

#[derive(Serialize)]
struct ProgressReport {
    quests: Vec<ProgressEntry>,
    degraded: usize,
    #[serde(skip)]
    now: DateTime<Utc>,
}

impl Report for ProgressReport {
    fn command(&self) -> &'static str {
        "progress"
    }

    fn render(&self, text: &mut TextReport) {
        text.title(format!("ggq progress: {} quest(s)", self.quests.len()))
            .fact("evaluated at", self.now.to_rfc3339());
        if self.degraded > 0 {
            text.fact("degraded", self.degraded);
        }

        for entry in &self.quests {
            let progress = &entry.progress;
            if let Some(error) = &progress.error {
                text.warn(format!("{}: {error}", entry.id));
                continue;
            }
            text.row(progress_row(entry, self.now));
        }
    }
}

/// `⏳ in_progress  run Morning Run: 40% (1 remaining), In 3 days`
fn progress_row(entry: &ProgressEntry, now: DateTime<Utc>) -> String {
    let progress = &entry.progress;
    let mut row = format!(
        "{} {:<11}  {} {}: {} ({})",
        progress_status_icon(progress.status),
        progress.status.as_str(),
        entry.id,
        entry.title,
        format_progress_percentage(f64::from(progress.percentage)),
        format_remaining_count(progress.remaining_count),
    );
    if let Some(eta) = progress.estimated_completion {
        row.push_str(&format!(", {}", format_estimated_completion(eta, now)));
    }
    if let (Some(current), Some(target), Some(scope)) = (
        progress.current_count,
        progress.target_count,
        progress.count_scope,
    ) {
        row.push_str(&format!(" [{current}/{target} {}]", scope.as_str()));
    }
    row
}

pub fn run(ctx: &CommandContext, options: ProgressOptions) -> Result<()> {
    let mut quests = load_quests(&options.quests)?;
    if let Some(id) = options.id.as_deref() {
        quests.retain(|quest| quest.id == id);
        if quests.is_empty() {
            return Err(Error::QuestNotFound(id.to_string()));
        }
    }

    let calculator = ProgressCalculator::from_config(&ctx.config.progress);
    let entries: Vec<ProgressEntry> = quests
        .iter()
        .map(|quest| ProgressEntry {
            id: quest.id.clone(),
            title: quest.title.clone(),
            kind: quest.kind.to_string(),
            progress: if options.detailed {
                calculator.detailed(quest, ctx.now)
            } else {
                calculator.quest_progress(quest, ctx.now)
            },
        })
        .collect();

    let degraded = entries
        .iter()
        .filter(|entry| entry.progress.error.is_some())
        .count();

    emit(
        ctx.output,
        &ProgressReport {
            quests: entries,
            degraded,
            now: ctx.now,
        },
    )
}
