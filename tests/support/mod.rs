#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use ggq::quest::{CountScope, Quest, QuestKind, QuestStatus};
use tempfile::TempDir;

/// Fixed evaluation instant shared by the integration tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 10, 0, 0).unwrap()
}

pub fn now_arg() -> String {
    now().to_rfc3339()
}

pub fn linked_quest(id: &str, status: QuestStatus, tasks: &[&str], age: Duration) -> Quest {
    let mut quest = Quest::new(id, QuestKind::Linked, status, now() - age);
    quest.title = format!("Quest {id}");
    quest.linked_task_ids = tasks.iter().map(|task| task.to_string()).collect();
    quest
}

pub fn quantitative_quest(id: &str, status: QuestStatus, target: i64, age: Duration) -> Quest {
    let mut quest = Quest::new(id, QuestKind::Quantitative, status, now() - age);
    quest.title = format!("Quest {id}");
    quest.target_count = Some(target);
    quest.count_scope = Some(CountScope::CompletedTasks);
    quest.period_days = Some(14);
    quest
}

/// Scratch directory with helpers for quest/profile fixtures.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn write_quests(&self, rel_path: &str, quests: &[Quest]) -> PathBuf {
        let json = serde_json::to_string_pretty(quests).expect("serialize quests");
        self.write_file(rel_path, &json)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// Config pointing the filter store at this workspace.
    pub fn write_config(&self) -> PathBuf {
        let content = format!(
            "[filters]\nstorage_dir = {:?}\n",
            self.store_dir().display().to_string()
        );
        self.write_file(".ggq.toml", &content)
    }

    pub fn ggq(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("ggq").expect("binary");
        cmd.current_dir(self.path());
        cmd.env_remove("GGQ_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}
