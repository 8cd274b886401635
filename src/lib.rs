//! ggq - GoalsGuild quest core
//!
//! This library backs the `ggq` CLI and can be embedded directly.
//!
//! # Core Concepts
//!
//! - **Quests**: linked quests track tasks (goals are display-only),
//!   quantitative quests track a count against a target over a period
//! - **Progress**: percentage, status and ETA derived on demand from a quest
//! - **Notifications**: preference-gated toasts for quest lifecycle events
//! - **Filters**: persisted status/difficulty/category/search selection
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.ggq.toml`
//! - `error`: Error types and result aliases
//! - `quest`: Quest records and loading
//! - `progress`: Progress calculation and validation
//! - `format`: Display helpers for progress
//! - `notify`: Notification policy, change detection and delivery
//! - `events`: JSONL toast sink
//! - `filters`: Filter state with write-through persistence
//! - `storage`: Key-value stores backing filter persistence
//! - `lock`: File locking and atomic writes for the file store
//! - `output`: Shared CLI output formatting

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod format;
pub mod lock;
pub mod notify;
pub mod output;
pub mod progress;
pub mod quest;
pub mod storage;

pub use error::{Error, Result};
pub use progress::{calculate_quest_progress, QuestProgress};
pub use quest::Quest;
