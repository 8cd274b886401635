//! Command-line interface for ggq
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is defined in its own submodule.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputOptions;

mod filter;
mod notify;
mod progress;

/// ggq - GoalsGuild quest toolkit
///
/// Computes quest progress, decides which quest notifications to show, and
/// manages persisted quest filters.
#[derive(Parser, Debug)]
#[command(name = "ggq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a config file (defaults to ./.ggq.toml)
    #[arg(long, global = true, env = "GGQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluate as of this RFC 3339 timestamp instead of now
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show progress for quests in a JSON file
    Progress {
        /// JSON file holding a quest or an array of quests
        quests: PathBuf,

        /// Include kind-specific fields such as progress rate
        #[arg(long)]
        detailed: bool,

        /// Only show the quest with this id
        #[arg(long)]
        id: Option<String>,
    },

    /// Notification policy commands
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Persisted quest filter commands
    #[command(subcommand)]
    Filter(FilterCommands),
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Check whether an event type would be shown for a profile
    Check {
        /// Event type (questStarted, questCompleted, questFailed, progressMilestone,
        /// deadlineWarning, streakAchieved, challengeJoined)
        #[arg(long)]
        event: String,

        /// Profile JSON with notificationPreferences
        #[arg(long)]
        profile: PathBuf,
    },

    /// Diff two quest snapshots into notification events
    Diff {
        /// Earlier snapshot
        previous: PathBuf,

        /// Later snapshot
        current: PathBuf,

        /// Profile JSON used to gate which events are shown
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Translations JSON with quest.notifications.messages templates
        #[arg(long)]
        translations: Option<PathBuf>,

        /// Write shown toasts as JSONL to a file, or "-" for stdout
        #[arg(long, requires = "profile")]
        events: Option<String>,
    },
}

/// Filter subcommands
#[derive(Subcommand, Debug)]
pub enum FilterCommands {
    /// Show the stored filter selection
    Show {
        /// Storage key suffix (defaults to filters.storage_key)
        #[arg(long)]
        key: Option<String>,
    },

    /// Update one or more filter fields
    Set {
        #[arg(long)]
        key: Option<String>,

        /// Quest status or "all"
        #[arg(long)]
        status: Option<String>,

        /// Difficulty or "all"
        #[arg(long)]
        difficulty: Option<String>,

        /// Category or "all"
        #[arg(long)]
        category: Option<String>,

        /// Search text ("" clears)
        #[arg(long)]
        search: Option<String>,
    },

    /// Reset filters to defaults
    Clear {
        #[arg(long)]
        key: Option<String>,
    },

    /// List quests from a JSON file that pass the stored filters
    Apply {
        /// JSON file holding a quest or an array of quests
        quests: PathBuf,

        #[arg(long)]
        key: Option<String>,
    },
}

/// Settings shared by every command
pub struct CommandContext {
    pub config: Config,
    pub now: DateTime<Utc>,
    pub output: OutputOptions,
}

impl Cli {
    /// Command path used in output envelopes, e.g. `"filter set"`.
    pub fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Progress { .. } => "progress",
            Commands::Notify(NotifyCommands::Check { .. }) => "notify check",
            Commands::Notify(NotifyCommands::Diff { .. }) => "notify diff",
            Commands::Filter(FilterCommands::Show { .. }) => "filter show",
            Commands::Filter(FilterCommands::Set { .. }) => "filter set",
            Commands::Filter(FilterCommands::Clear { .. }) => "filter clear",
            Commands::Filter(FilterCommands::Apply { .. }) => "filter apply",
        }
    }

    /// Whether a failure should be reported as JSON. Not when toasts already
    /// stream to stdout.
    pub fn json_errors(&self) -> bool {
        let toasts_on_stdout = match &self.command {
            Commands::Notify(NotifyCommands::Diff { events, .. }) => events
                .as_deref()
                .map(|value| value.trim() == "-")
                .unwrap_or(false),
            _ => false,
        };
        self.json && !toasts_on_stdout
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = CommandContext {
            config: resolve_config(self.config.as_deref())?,
            now: resolve_now(self.now.as_deref())?,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        };

        match self.command {
            Commands::Progress {
                quests,
                detailed,
                id,
            } => progress::run(
                &ctx,
                progress::ProgressOptions {
                    quests,
                    detailed,
                    id,
                },
            ),
            Commands::Notify(cmd) => match cmd {
                NotifyCommands::Check { event, profile } => {
                    notify::run_check(&ctx, notify::CheckOptions { event, profile })
                }
                NotifyCommands::Diff {
                    previous,
                    current,
                    profile,
                    translations,
                    events,
                } => notify::run_diff(
                    &ctx,
                    notify::DiffOptions {
                        previous,
                        current,
                        profile,
                        translations,
                        events,
                    },
                ),
            },
            Commands::Filter(cmd) => match cmd {
                FilterCommands::Show { key } => filter::run_show(&ctx, key),
                FilterCommands::Set {
                    key,
                    status,
                    difficulty,
                    category,
                    search,
                } => filter::run_set(
                    &ctx,
                    filter::SetOptions {
                        key,
                        status,
                        difficulty,
                        category,
                        search,
                    },
                ),
                FilterCommands::Clear { key } => filter::run_clear(&ctx, key),
                FilterCommands::Apply { quests, key } => filter::run_apply(&ctx, quests, key),
            },
        }
    }
}

fn resolve_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(Config::load_from_dir(&cwd))
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| Error::InvalidArgument(format!("--now '{raw}': {err}"))),
        None => Ok(Utc::now()),
    }
}

fn read_json_file(path: &std::path::Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
