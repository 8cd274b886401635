mod support;

use chrono::{DateTime, Duration, Utc};
use ggq::config::ProgressConfig;
use ggq::error::Error;
use ggq::progress::{
    calculate_detailed_quest_progress, calculate_linked_quest_progress,
    calculate_quantitative_quest_progress, calculate_quest_progress, validate_quest_progress,
    CountProgress, ProgressCalculator, ProgressEstimator, ProgressStatus,
};
use ggq::quest::{Quest, QuestKind, QuestStatus};
use serde_json::json;

use support::{linked_quest, now, quantitative_quest};

#[test]
fn completed_linked_quest_is_full() {
    let mut quest = linked_quest(
        "done",
        QuestStatus::Completed,
        &["t1", "t2", "t3"],
        Duration::days(1),
    );
    quest.linked_goal_ids = vec!["g1".to_string(), "g2".to_string()];

    let progress = calculate_linked_quest_progress(&quest, now()).expect("progress");
    assert_eq!(progress.percentage, 100);
    assert_eq!(progress.status, ProgressStatus::Completed);
    assert_eq!(progress.completed_count, 3);
    assert_eq!(progress.total_count, 3);
    assert_eq!(progress.remaining_count, 0);
    assert!(progress.estimated_completion.is_none());
    assert_eq!(
        progress.linked_goals_progress,
        Some(CountProgress {
            completed: 2,
            total: 2
        })
    );
}

#[test]
fn linked_quest_without_tasks_has_not_started() {
    let mut quest = linked_quest("empty", QuestStatus::Active, &[], Duration::days(10));
    quest.linked_goal_ids = vec!["g1".to_string(), "g2".to_string()];

    let progress = calculate_linked_quest_progress(&quest, now()).expect("progress");
    assert_eq!(progress.percentage, 0);
    assert_eq!(progress.status, ProgressStatus::NotStarted);
    assert_eq!(progress.total_count, 0);
    assert!(progress.estimated_completion.is_none());
    assert_eq!(
        progress.linked_goals_progress,
        Some(CountProgress {
            completed: 0,
            total: 2
        })
    );
}

#[test]
fn linked_total_counts_tasks_only() {
    for tasks in [vec!["a"], vec!["a", "b"], vec!["a", "b", "c", "d", "e"]] {
        let mut quest = linked_quest("q", QuestStatus::Active, &tasks, Duration::days(1));
        quest.linked_goal_ids = vec!["g1".to_string(); 7];

        let progress = calculate_linked_quest_progress(&quest, now()).expect("progress");
        assert_eq!(progress.total_count, tasks.len() as i64);
        assert!(progress.completed_count < progress.total_count);
        assert_eq!(
            progress.remaining_count,
            progress.total_count - progress.completed_count
        );
    }
}

#[test]
fn two_day_old_quest_with_two_tasks_is_half_done() {
    let quest = linked_quest("e2e", QuestStatus::Active, &["t1", "t2"], Duration::days(2));

    let progress = calculate_quest_progress(&quest, now());
    assert!(progress.error.is_none());
    assert_eq!(progress.percentage, 40);
    assert_eq!(progress.status, ProgressStatus::InProgress);
    assert_eq!(progress.completed_count, 1);
    assert_eq!(progress.remaining_count, 1);
    assert_eq!(
        progress.estimated_completion,
        Some(now() + Duration::days(3))
    );
}

#[test]
fn old_unfinished_quest_never_reaches_completion() {
    let quest = linked_quest("old", QuestStatus::Active, &["t1"], Duration::days(365));

    let progress = calculate_quest_progress(&quest, now());
    assert_eq!(progress.percentage, 99);
    assert_eq!(progress.status, ProgressStatus::InProgress);
    assert_eq!(progress.completed_count, 0);
}

#[test]
fn quantitative_input_errors_are_distinct() {
    let mut zero_target = quantitative_quest("q", QuestStatus::Active, 0, Duration::days(1));
    let err = calculate_quantitative_quest_progress(&zero_target, now()).unwrap_err();
    assert!(matches!(err, Error::InvalidTargetCount(0)));

    zero_target.target_count = None;
    let err = calculate_quantitative_quest_progress(&zero_target, now()).unwrap_err();
    assert!(matches!(err, Error::InvalidTargetCount(0)));

    let mut no_scope = quantitative_quest("q", QuestStatus::Active, 5, Duration::days(1));
    no_scope.count_scope = None;
    let err = calculate_quantitative_quest_progress(&no_scope, now()).unwrap_err();
    assert!(matches!(err, Error::MissingCountScope));

    let mut no_period = quantitative_quest("q", QuestStatus::Active, 5, Duration::days(1));
    no_period.period_days = Some(0);
    let err = calculate_quantitative_quest_progress(&no_period, now()).unwrap_err();
    assert!(matches!(err, Error::InvalidPeriod(0)));
}

#[test]
fn calculators_reject_the_wrong_kind() {
    let linked = linked_quest("l", QuestStatus::Active, &["t1"], Duration::days(1));
    let err = calculate_quantitative_quest_progress(&linked, now()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid quest kind: expected quantitative, got linked"
    );

    let counted = quantitative_quest("c", QuestStatus::Active, 3, Duration::days(1));
    assert!(matches!(
        calculate_linked_quest_progress(&counted, now()),
        Err(Error::InvalidQuestKind { .. })
    ));
}

#[test]
fn quantitative_progress_reports_rate_and_period_end() {
    let quest = quantitative_quest("count", QuestStatus::Active, 10, Duration::days(2));

    let progress = calculate_detailed_quest_progress(&quest, now());
    assert_eq!(progress.percentage, 40);
    assert_eq!(progress.completed_count, 4);
    assert_eq!(progress.total_count, 10);
    assert_eq!(progress.target_count, Some(10));
    assert_eq!(progress.current_count, Some(4));
    assert_eq!(progress.period_days, Some(14));
    assert_eq!(progress.progress_rate, Some(2.0));
    assert_eq!(
        progress.estimated_completion,
        Some(now() - Duration::days(2) + Duration::days(14))
    );
}

#[test]
fn completed_quantitative_quest_has_no_eta() {
    let quest = quantitative_quest("count", QuestStatus::Completed, 5, Duration::days(10));

    let progress = calculate_detailed_quest_progress(&quest, now());
    assert_eq!(progress.percentage, 100);
    assert_eq!(progress.completed_count, 5);
    assert_eq!(progress.remaining_count, 0);
    assert_eq!(progress.progress_rate, Some(0.5));
    assert!(progress.estimated_completion.is_none());
}

#[test]
fn fresh_quest_uses_one_day_floor_for_rate() {
    let quest = quantitative_quest("new", QuestStatus::Active, 4, Duration::hours(1));

    let progress = calculate_detailed_quest_progress(&quest, now());
    assert_eq!(progress.percentage, 1);
    assert_eq!(progress.current_count, Some(0));
    assert_eq!(progress.progress_rate, Some(0.0));
}

#[test]
fn unrepresentable_period_end_leaves_eta_empty() {
    for period in [100_000_000, i64::MAX] {
        let mut quest = quantitative_quest("long", QuestStatus::Active, 10, Duration::days(2));
        quest.period_days = Some(period);

        let progress = calculate_detailed_quest_progress(&quest, now());
        assert!(progress.error.is_none(), "{:?}", progress.error);
        assert_eq!(progress.percentage, 40);
        assert_eq!(progress.period_days, Some(period));
        assert!(progress.estimated_completion.is_none());
        assert!(progress.is_valid());
        assert!(calculate_quest_progress(&quest, now()).error.is_none());
    }
}

#[test]
fn tiny_daily_rate_leaves_linked_eta_empty() {
    let calculator = ProgressCalculator::from_config(&ProgressConfig {
        daily_rate_percent: 1e-300,
        max_simulated_percent: 99,
    });
    let quest = linked_quest("slow", QuestStatus::Active, &["t1", "t2"], Duration::days(2));

    let progress = calculator.quest_progress(&quest, now());
    assert!(progress.error.is_none());
    assert_eq!(progress.percentage, 0);
    assert!(progress.estimated_completion.is_none());
}

#[test]
fn unsupported_kind_degrades() {
    let quest = Quest::new(
        "streaky",
        QuestKind::Other("streak".to_string()),
        QuestStatus::Active,
        now(),
    );

    let progress = calculate_quest_progress(&quest, now());
    assert_eq!(progress.error.as_deref(), Some("Unsupported quest kind: streak"));
    assert_eq!(progress.percentage, 0);
    assert_eq!(progress.status, ProgressStatus::NotStarted);
    assert_eq!(progress.total_count, 0);
    assert!(progress.is_valid());
}

#[test]
fn dispatcher_degrades_on_invalid_quantitative_quest() {
    let quest = quantitative_quest("bad", QuestStatus::Active, -3, Duration::days(1));

    let progress = calculate_quest_progress(&quest, now());
    let error = progress.error.expect("error");
    assert!(error.contains("Invalid target count: -3"), "{error}");
    assert_eq!(progress.percentage, 0);
}

#[test]
fn calculator_honours_configured_rate() {
    let calculator = ProgressCalculator::from_config(&ProgressConfig {
        daily_rate_percent: 10.0,
        max_simulated_percent: 50,
    });

    let young = linked_quest("y", QuestStatus::Active, &["t1", "t2"], Duration::days(2));
    assert_eq!(calculator.quest_progress(&young, now()).percentage, 20);

    let old = linked_quest("o", QuestStatus::Active, &["t1", "t2"], Duration::days(30));
    assert_eq!(calculator.quest_progress(&old, now()).percentage, 50);
}

struct FixedEstimate(f64);

impl ProgressEstimator for FixedEstimate {
    fn estimate_percent(&self, _quest: &Quest, _now: DateTime<Utc>) -> f64 {
        self.0
    }

    fn days_to_complete(&self, _percent: f64) -> Option<f64> {
        None
    }
}

#[test]
fn custom_estimator_drives_linked_progress() {
    let calculator = ProgressCalculator::with_estimator(FixedEstimate(50.0));
    let quest = linked_quest("q", QuestStatus::Active, &["a", "b", "c", "d"], Duration::zero());

    let progress = calculator.linked(&quest, now()).expect("progress");
    assert_eq!(progress.percentage, 50);
    assert_eq!(progress.completed_count, 2);
    assert!(progress.estimated_completion.is_none());
}

#[test]
fn computed_progress_validates() {
    let quest = linked_quest("q", QuestStatus::Active, &["t1", "t2"], Duration::days(2));
    let progress = calculate_quest_progress(&quest, now());

    let raw = serde_json::to_value(&progress).expect("json");
    assert_eq!(raw["status"], "in_progress");
    assert_eq!(raw["completedCount"], 1);
    assert!(validate_quest_progress(&raw));
}

#[test]
fn validation_rejects_out_of_range_values() {
    let valid = json!({
        "percentage": 50,
        "status": "in_progress",
        "completedCount": 1,
        "totalCount": 2,
        "remainingCount": 1,
        "lastUpdated": "2026-04-15T10:00:00+00:00"
    });
    assert!(validate_quest_progress(&valid));

    let mut over = valid.clone();
    over["percentage"] = json!(101);
    assert!(!validate_quest_progress(&over));

    let mut under = valid.clone();
    under["percentage"] = json!(-1);
    assert!(!validate_quest_progress(&under));

    let mut negative = valid.clone();
    negative["completedCount"] = json!(-2);
    assert!(!validate_quest_progress(&negative));

    let mut status = valid.clone();
    status["status"] = json!("paused");
    assert!(!validate_quest_progress(&status));

    let mut timestamp = valid.clone();
    timestamp["lastUpdated"] = json!("yesterday");
    assert!(!validate_quest_progress(&timestamp));

    let mut date_only = valid.clone();
    date_only["lastUpdated"] = json!("2024-01-15");
    assert!(validate_quest_progress(&date_only));

    let mut zoneless = valid.clone();
    zoneless["lastUpdated"] = json!("2024-01-15T10:00:00.000");
    assert!(validate_quest_progress(&zoneless));

    let mut utc = valid.clone();
    utc["lastUpdated"] = json!("2024-01-15T10:00:00.000Z");
    assert!(validate_quest_progress(&utc));

    let mut bad_day = valid.clone();
    bad_day["lastUpdated"] = json!("2024-02-30");
    assert!(!validate_quest_progress(&bad_day));

    let mut missing = valid.clone();
    missing
        .as_object_mut()
        .expect("object")
        .remove("totalCount");
    assert!(!validate_quest_progress(&missing));
}
