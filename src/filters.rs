//! Quest filter selection with write-through persistence.
//!
//! [`QuestFilters`] owns the current `{status, difficulty, category, search}`
//! snapshot and mirrors every change into a [`KeyValueStore`] entry named
//! `quest-filters-<key>`. Storage failures never reach the caller; the
//! in-memory snapshot stays authoritative.

use serde::{Deserialize, Serialize};

use crate::quest::Quest;
use crate::storage::KeyValueStore;

pub const FILTER_KEY_PREFIX: &str = "quest-filters-";

/// Sentinel for "no restriction" on status, difficulty and category.
pub const ALL: &str = "all";

/// Storage key for a filter set: `quest-filters-<key|default>`.
pub fn filter_storage_key(storage_key: Option<&str>) -> String {
    let suffix = storage_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .unwrap_or("default");
    format!("{FILTER_KEY_PREFIX}{suffix}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestFilterState {
    pub status: String,
    pub difficulty: String,
    pub category: String,
    pub search: String,
}

impl Default for QuestFilterState {
    fn default() -> Self {
        Self {
            status: ALL.to_string(),
            difficulty: ALL.to_string(),
            category: ALL.to_string(),
            search: String::new(),
        }
    }
}

/// Partial filter object: caller defaults, stored snapshots and bulk updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FilterOverrides {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.difficulty.is_none()
            && self.category.is_none()
            && self.search.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Status,
    Difficulty,
    Category,
    Search,
}

impl FilterField {
    pub const ALL_FIELDS: [FilterField; 4] = [
        FilterField::Status,
        FilterField::Difficulty,
        FilterField::Category,
        FilterField::Search,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Status => "Status",
            FilterField::Difficulty => "Difficulty",
            FilterField::Category => "Category",
            FilterField::Search => "Search",
        }
    }
}

impl QuestFilterState {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Status => &self.status,
            FilterField::Difficulty => &self.difficulty,
            FilterField::Category => &self.category,
            FilterField::Search => &self.search,
        }
    }

    fn slot(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Status => &mut self.status,
            FilterField::Difficulty => &mut self.difficulty,
            FilterField::Category => &mut self.category,
            FilterField::Search => &mut self.search,
        }
    }

    /// Copy of `self` with every present override applied.
    pub fn merged(&self, overrides: &FilterOverrides) -> Self {
        let mut next = self.clone();
        next.apply(overrides);
        next
    }

    /// Apply overrides in place, returning the fields whose value changed.
    pub fn apply(&mut self, overrides: &FilterOverrides) -> Vec<FilterField> {
        let pairs = [
            (FilterField::Status, &overrides.status),
            (FilterField::Difficulty, &overrides.difficulty),
            (FilterField::Category, &overrides.category),
            (FilterField::Search, &overrides.search),
        ];

        let mut changed = Vec::new();
        for (field, value) in pairs {
            if let Some(value) = value {
                let slot = self.slot(field);
                if slot != value {
                    *slot = value.clone();
                    changed.push(field);
                }
            }
        }
        changed
    }

    fn is_field_active(&self, field: FilterField) -> bool {
        match field {
            FilterField::Search => !self.search.is_empty(),
            other => self.get(other) != ALL,
        }
    }

    /// Fields that differ from the universal defaults (`all` / empty search).
    pub fn active_fields(&self) -> Vec<FilterField> {
        FilterField::ALL_FIELDS
            .into_iter()
            .filter(|field| self.is_field_active(*field))
            .collect()
    }

    pub fn has_active_filters(&self) -> bool {
        FilterField::ALL_FIELDS
            .iter()
            .any(|field| self.is_field_active(*field))
    }

    pub fn active_filter_count(&self) -> usize {
        self.active_fields().len()
    }

    /// Whether `quest` passes every active filter.
    pub fn matches(&self, quest: &Quest) -> bool {
        if self.status != ALL && quest.status.as_str() != self.status {
            return false;
        }
        if !matches_optional(&self.difficulty, quest.difficulty.as_deref()) {
            return false;
        }
        if !matches_optional(&self.category, quest.category.as_deref()) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        quest.title.to_lowercase().contains(&needle) || quest.id.to_lowercase().contains(&needle)
    }
}

fn matches_optional(filter: &str, value: Option<&str>) -> bool {
    if filter == ALL {
        return true;
    }
    value
        .map(|value| value.eq_ignore_ascii_case(filter))
        .unwrap_or(false)
}

/// Quests passing `filters`, in input order.
pub fn apply_filters<'a>(filters: &QuestFilterState, quests: &'a [Quest]) -> Vec<&'a Quest> {
    quests.iter().filter(|quest| filters.matches(quest)).collect()
}

/// Urgency of an accessibility announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncePriority {
    Polite,
    Assertive,
}

/// Receives search text on every search change; debouncing is up to the implementor.
pub trait SearchValidator {
    fn validate(&mut self, search: &str);
}

impl<F: FnMut(&str)> SearchValidator for F {
    fn validate(&mut self, search: &str) {
        self(search)
    }
}

type AnnounceFn = Box<dyn FnMut(&str, AnnouncePriority)>;
type FiltersChangeFn = Box<dyn FnMut(&QuestFilterState)>;

/// Construction options for [`QuestFilters`].
#[derive(Default)]
pub struct FilterOptions {
    pub storage_key: Option<String>,
    pub defaults: FilterOverrides,
    pub on_announce: Option<AnnounceFn>,
    pub on_filters_change: Option<FiltersChangeFn>,
    pub search_validator: Option<Box<dyn SearchValidator>>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn defaults(mut self, defaults: FilterOverrides) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn on_announce(mut self, callback: impl FnMut(&str, AnnouncePriority) + 'static) -> Self {
        self.on_announce = Some(Box::new(callback));
        self
    }

    pub fn on_filters_change(mut self, callback: impl FnMut(&QuestFilterState) + 'static) -> Self {
        self.on_filters_change = Some(Box::new(callback));
        self
    }

    pub fn search_validator(mut self, validator: impl SearchValidator + 'static) -> Self {
        self.search_validator = Some(Box::new(validator));
        self
    }
}

/// Filter selection bound to one storage entry.
pub struct QuestFilters<S: KeyValueStore> {
    store: S,
    key: String,
    defaults: QuestFilterState,
    current: QuestFilterState,
    on_announce: Option<AnnounceFn>,
    on_filters_change: Option<FiltersChangeFn>,
    search_validator: Option<Box<dyn SearchValidator>>,
}

impl<S: KeyValueStore> QuestFilters<S> {
    /// Load the stored selection, falling back to the caller's defaults.
    ///
    /// Stored keys win over `options.defaults`; defaults fill whatever the
    /// stored object lacks. Unreadable or malformed entries are ignored.
    pub fn new(store: S, options: FilterOptions) -> Self {
        let key = filter_storage_key(options.storage_key.as_deref());
        let defaults = QuestFilterState::default().merged(&options.defaults);

        let current = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<FilterOverrides>(&raw) {
                Ok(stored) => defaults.merged(&stored),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "discarding malformed stored filters");
                    defaults.clone()
                }
            },
            Ok(None) => defaults.clone(),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to read stored filters");
                defaults.clone()
            }
        };

        Self {
            store,
            key,
            defaults,
            current,
            on_announce: options.on_announce,
            on_filters_change: options.on_filters_change,
            search_validator: options.search_validator,
        }
    }

    pub fn filters(&self) -> &QuestFilterState {
        &self.current
    }

    pub fn defaults(&self) -> &QuestFilterState {
        &self.defaults
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.update_filters(FilterOverrides {
            status: Some(status.into()),
            ..FilterOverrides::default()
        });
    }

    pub fn set_difficulty(&mut self, difficulty: impl Into<String>) {
        self.update_filters(FilterOverrides {
            difficulty: Some(difficulty.into()),
            ..FilterOverrides::default()
        });
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.update_filters(FilterOverrides {
            category: Some(category.into()),
            ..FilterOverrides::default()
        });
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.update_filters(FilterOverrides {
            search: Some(search.into()),
            ..FilterOverrides::default()
        });
    }

    /// Apply a partial update. Unchanged values cause no write and no callbacks.
    pub fn update_filters(&mut self, overrides: FilterOverrides) {
        let changed = self.current.apply(&overrides);
        if changed.is_empty() {
            return;
        }

        self.persist();

        if changed.contains(&FilterField::Search) {
            if let Some(validator) = self.search_validator.as_mut() {
                validator.validate(&self.current.search);
            }
        }

        let message = match changed.as_slice() {
            [field] => describe_change(*field, self.current.get(*field)),
            fields => format!("{} filters updated", fields.len()),
        };
        self.announce(&message, AnnouncePriority::Polite);
        self.notify_change();
    }

    /// Restore the defaults supplied at construction.
    pub fn clear_filters(&mut self) {
        let changed = self.current != self.defaults;
        if changed {
            self.current = self.defaults.clone();
            self.persist();
        }
        self.announce("All filters cleared", AnnouncePriority::Assertive);
        if changed {
            self.notify_change();
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.clear_filters();
    }

    pub fn has_active_filters(&self) -> bool {
        self.current.has_active_filters()
    }

    pub fn active_filter_count(&self) -> usize {
        self.current.active_filter_count()
    }

    fn persist(&mut self) {
        let payload = match serde_json::to_string(&self.current) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to encode filters");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.key, &payload) {
            tracing::warn!(key = %self.key, error = %err, "failed to persist filters");
        } else {
            tracing::debug!(key = %self.key, "persisted filters");
        }
    }

    fn announce(&mut self, message: &str, priority: AnnouncePriority) {
        if let Some(callback) = self.on_announce.as_mut() {
            callback(message, priority);
        }
    }

    fn notify_change(&mut self) {
        if let Some(callback) = self.on_filters_change.as_mut() {
            callback(&self.current);
        }
    }
}

fn describe_change(field: FilterField, value: &str) -> String {
    match field {
        FilterField::Search if value.is_empty() => "Search cleared".to_string(),
        FilterField::Search => format!("Search set to \"{value}\""),
        other if value == ALL => format!("{} filter cleared", other.label()),
        other => format!("{} filter set to {value}", other.label()),
    }
}
