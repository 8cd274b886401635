//! ggq filter command implementation

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;

use super::CommandContext;
use crate::error::{Error, Result};
use crate::filters::{
    apply_filters, FilterOptions, FilterOverrides, QuestFilterState, QuestFilters, ALL,
};
use crate::output::{emit, Report, TextReport};
use crate::quest::{load_quests, Quest, QuestStatus};
use crate::storage::FileStore;

/// Options for `ggq filter set`
pub struct SetOptions {
    pub key: Option<String>,
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
struct FilterReport {
    key: String,
    filters: QuestFilterState,
    active: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    announcements: Vec<String>,
    #[serde(skip)]
    command: &'static str,
}

impl Report for FilterReport {
    fn command(&self) -> &'static str {
        self.command
    }

    fn render(&self, text: &mut TextReport) {
        text.title(format!("ggq {}: {}", self.command, self.key))
            .fact("status", &self.filters.status)
            .fact("difficulty", &self.filters.difficulty)
            .fact("category", &self.filters.category)
            .fact("search", format!("\"{}\"", self.filters.search))
            .fact("active filters", self.active);
        for message in &self.announcements {
            text.row(message.as_str());
        }
        if self.command == "filter set" && self.announcements.is_empty() {
            text.row("no changes");
        }
    }
}

#[derive(Serialize)]
struct ApplyReport {
    key: String,
    filters: QuestFilterState,
    total: usize,
    matched: Vec<String>,
    #[serde(skip)]
    rows: Vec<String>,
}

impl Report for ApplyReport {
    fn command(&self) -> &'static str {
        "filter apply"
    }

    fn render(&self, text: &mut TextReport) {
        text.title(format!(
            "ggq filter apply: {} of {} quest(s)",
            self.matched.len(),
            self.total
        ));
        text.fact("key", &self.key);
        if !self.filters.search.is_empty() {
            text.fact("search", format!("\"{}\"", self.filters.search));
        }
        for row in &self.rows {
            text.row(row.as_str());
        }
    }
}

fn apply_row(quest: &Quest) -> String {
    format!("{} [{}] {}", quest.id, quest.status, quest.title)
}

type Announcements = Rc<RefCell<Vec<String>>>;

fn open_filters(
    ctx: &CommandContext,
    key: Option<String>,
) -> Result<(QuestFilters<FileStore>, Announcements)> {
    let store = match ctx.config.filters.storage_dir.clone() {
        Some(dir) => FileStore::new(dir),
        None => FileStore::open_default()?,
    };
    let key = key.unwrap_or_else(|| ctx.config.filters.storage_key.clone());

    let announcements: Announcements = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&announcements);
    let options = FilterOptions::new()
        .storage_key(key)
        .on_announce(move |message, _priority| sink.borrow_mut().push(message.to_string()));

    Ok((QuestFilters::new(store, options), announcements))
}

fn build_report(
    command: &'static str,
    filters: &QuestFilters<FileStore>,
    announcements: &Announcements,
) -> FilterReport {
    FilterReport {
        key: filters.storage_key().to_string(),
        filters: filters.filters().clone(),
        active: filters.active_filter_count(),
        announcements: announcements.borrow().clone(),
        command,
    }
}

pub fn run_show(ctx: &CommandContext, key: Option<String>) -> Result<()> {
    let (filters, announcements) = open_filters(ctx, key)?;
    emit(ctx.output, &build_report("filter show", &filters, &announcements))
}

pub fn run_set(ctx: &CommandContext, options: SetOptions) -> Result<()> {
    if let Some(status) = options.status.as_deref() {
        if status != ALL {
            status.parse::<QuestStatus>()?;
        }
    }

    let overrides = FilterOverrides {
        status: options.status,
        difficulty: options.difficulty,
        category: options.category,
        search: options.search,
    };
    if overrides.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to set (use --status, --difficulty, --category or --search)".to_string(),
        ));
    }

    let (mut filters, announcements) = open_filters(ctx, options.key)?;
    filters.update_filters(overrides);

    emit(ctx.output, &build_report("filter set", &filters, &announcements))
}

pub fn run_clear(ctx: &CommandContext, key: Option<String>) -> Result<()> {
    let (mut filters, announcements) = open_filters(ctx, key)?;
    filters.clear_filters();

    emit(ctx.output, &build_report("filter clear", &filters, &announcements))
}

pub fn run_apply(ctx: &CommandContext, quests: PathBuf, key: Option<String>) -> Result<()> {
    let quests = load_quests(&quests)?;
    let (filters, _) = open_filters(ctx, key)?;

    let matched = apply_filters(filters.filters(), &quests);

    emit(
        ctx.output,
        &ApplyReport {
            key: filters.storage_key().to_string(),
            filters: filters.filters().clone(),
            total: quests.len(),
            matched: matched.iter().map(|quest| quest.id.clone()).collect(),
            rows: matched.into_iter().map(apply_row).collect(),
        },
    )
}
