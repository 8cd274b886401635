mod support;

use chrono::Duration;
use ggq::config::NotifyConfig;
use ggq::notify::{
    detect_quest_changes, get_notification_message, should_notify, FileProfileSource,
    MemorySink, NotificationChannels, NotificationEvent, NotificationEventType,
    NotificationPreferences, QuestChangeTracker, QuestNotifier, UserProfile,
};
use ggq::quest::{Quest, QuestStatus};
use serde_json::json;

use support::{linked_quest, now};

fn quest(id: &str, status: QuestStatus) -> Quest {
    linked_quest(id, status, &["t1"], Duration::days(1))
}

fn types(events: &[NotificationEvent]) -> Vec<NotificationEventType> {
    events.iter().map(|event| event.event_type).collect()
}

fn profile(preferences: Option<NotificationPreferences>) -> UserProfile {
    UserProfile {
        notification_preferences: preferences,
        ..UserProfile::default()
    }
}

#[test]
fn should_notify_requires_toggle_and_in_app_channel() {
    let all = NotificationPreferences::all_in_app();
    let no_channel = NotificationPreferences {
        channels: NotificationChannels {
            in_app: false,
            email: true,
            push: true,
        },
        ..all
    };

    for event_type in NotificationEventType::ALL {
        assert!(!should_notify(event_type, None), "{event_type}");
        assert!(should_notify(event_type, Some(&all)), "{event_type}");
        assert!(!should_notify(event_type, Some(&no_channel)), "{event_type}");
    }

    let no_failures = NotificationPreferences {
        quest_failed: false,
        ..all
    };
    assert!(!should_notify(
        NotificationEventType::QuestFailed,
        Some(&no_failures)
    ));
    assert!(should_notify(
        NotificationEventType::QuestCompleted,
        Some(&no_failures)
    ));
}

#[test]
fn missing_preference_fields_read_as_off() {
    let preferences: NotificationPreferences =
        serde_json::from_value(json!({ "questCompleted": true, "channels": { "inApp": true } }))
            .expect("preferences");

    assert!(should_notify(
        NotificationEventType::QuestCompleted,
        Some(&preferences)
    ));
    assert!(!should_notify(
        NotificationEventType::QuestStarted,
        Some(&preferences)
    ));
}

#[test]
fn new_quests_start_only_when_active() {
    let current = vec![
        quest("a", QuestStatus::Active),
        quest("d", QuestStatus::Draft),
    ];

    let events = detect_quest_changes(&[], &current, now(), &NotifyConfig::default());
    assert_eq!(types(&events), vec![NotificationEventType::QuestStarted]);
    assert_eq!(events[0].quest_id(), Some("a"));
}

#[test]
fn status_changes_map_to_events() {
    let previous = vec![
        quest("started", QuestStatus::Draft),
        quest("won", QuestStatus::Active),
        quest("lost", QuestStatus::Active),
        quest("shelved", QuestStatus::Completed),
    ];
    let current = vec![
        quest("started", QuestStatus::Active),
        quest("won", QuestStatus::Completed),
        quest("lost", QuestStatus::Failed),
        quest("shelved", QuestStatus::Archived),
    ];

    let events = detect_quest_changes(&previous, &current, now(), &NotifyConfig::default());
    assert_eq!(
        types(&events),
        vec![
            NotificationEventType::QuestStarted,
            NotificationEventType::QuestCompleted,
            NotificationEventType::QuestFailed,
        ]
    );
}

#[test]
fn unchanged_snapshots_are_quiet() {
    let snapshot = vec![quest("a", QuestStatus::Active), quest("b", QuestStatus::Draft)];
    let events = detect_quest_changes(&snapshot, &snapshot, now(), &NotifyConfig::default());
    assert!(events.is_empty());
}

#[test]
fn milestone_reports_lowest_crossed_threshold() {
    let mut before = quest("m", QuestStatus::Active);
    before.progress = Some(20);
    let mut after = before.clone();
    after.progress = Some(80);

    let events = detect_quest_changes(&[before], &[after], now(), &NotifyConfig::default());
    assert_eq!(types(&events), vec![NotificationEventType::ProgressMilestone]);
    assert_eq!(events[0].data.percentage, Some(25));
}

#[test]
fn milestone_needs_reported_progress() {
    let before = quest("m", QuestStatus::Active);
    let mut after = before.clone();
    after.progress = Some(50);

    let events = detect_quest_changes(
        &[before.clone()],
        &[after],
        now(),
        &NotifyConfig::default(),
    );
    assert_eq!(events[0].data.percentage, Some(25));

    let events = detect_quest_changes(&[before.clone()], &[before], now(), &NotifyConfig::default());
    assert!(events.is_empty());
}

#[test]
fn deadline_warning_inside_window_only() {
    let config = NotifyConfig::default();

    let mut soon = quest("soon", QuestStatus::Active);
    soon.deadline = Some(now() + Duration::hours(5));
    let mut later = quest("later", QuestStatus::Active);
    later.deadline = Some(now() + Duration::hours(30));
    let mut past = quest("past", QuestStatus::Active);
    past.deadline = Some(now() - Duration::hours(1));
    let mut finished = quest("finished", QuestStatus::Completed);
    finished.deadline = Some(now() + Duration::hours(2));

    let snapshot = vec![soon, later, past, finished];
    let events = detect_quest_changes(&snapshot, &snapshot, now(), &config);
    assert_eq!(types(&events), vec![NotificationEventType::DeadlineWarning]);
    assert_eq!(events[0].quest_id(), Some("soon"));
    assert_eq!(events[0].data.days, Some(1));
}

#[test]
fn stateless_detection_repeats_deadline_warnings() {
    let mut due = quest("due", QuestStatus::Active);
    due.deadline = Some(now() + Duration::hours(3));
    let snapshot = vec![due];

    let config = NotifyConfig::default();
    let first = detect_quest_changes(&snapshot, &snapshot, now(), &config);
    let second = detect_quest_changes(&snapshot, &snapshot, now() + Duration::hours(1), &config);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[test]
fn tracker_warns_once_per_deadline() {
    let mut due = quest("due", QuestStatus::Active);
    let deadline = now() + Duration::hours(5);
    due.deadline = Some(deadline);

    let mut tracker = QuestChangeTracker::with_baseline(NotifyConfig::default(), vec![due.clone()]);

    let first = tracker.observe(vec![due.clone()], now());
    assert_eq!(types(&first), vec![NotificationEventType::DeadlineWarning]);
    assert_eq!(tracker.warned_deadline("due"), Some(deadline));

    let second = tracker.observe(vec![due.clone()], now() + Duration::hours(1));
    assert!(second.is_empty());

    let mut moved = due.clone();
    moved.deadline = Some(now() + Duration::hours(10));
    let third = tracker.observe(vec![moved], now() + Duration::hours(2));
    assert_eq!(types(&third), vec![NotificationEventType::DeadlineWarning]);
}

#[test]
fn tracker_reports_new_quests_against_empty_snapshot() {
    let mut tracker = QuestChangeTracker::new(NotifyConfig::default());

    let events = tracker.observe(vec![quest("a", QuestStatus::Active)], now());
    assert_eq!(types(&events), vec![NotificationEventType::QuestStarted]);
    assert_eq!(tracker.snapshot().len(), 1);

    let events = tracker.observe(vec![quest("a", QuestStatus::Completed)], now());
    assert_eq!(types(&events), vec![NotificationEventType::QuestCompleted]);

    tracker.reset();
    assert!(tracker.snapshot().is_empty());
}

#[test]
fn fallback_messages_substitute_values() {
    let mut done = quest("q", QuestStatus::Completed);
    done.title = "Read 5 books".to_string();

    let completed = NotificationEvent::for_quest(NotificationEventType::QuestCompleted, &done, now());
    assert_eq!(
        get_notification_message(&completed, None),
        "Congratulations! Quest \"Read 5 books\" completed!"
    );

    let milestone =
        NotificationEvent::for_quest(NotificationEventType::ProgressMilestone, &done, now())
            .with_percentage(50);
    assert_eq!(
        get_notification_message(&milestone, None),
        "Quest \"Read 5 books\" is 50% complete!"
    );

    let streak = NotificationEvent::new(NotificationEventType::StreakAchieved, now()).with_days(7);
    assert_eq!(
        get_notification_message(&streak, None),
        "Amazing! You reached a 7-day streak!"
    );
}

#[test]
fn translations_override_per_event_type() {
    let mut started = quest("q", QuestStatus::Active);
    started.title = "Dragon".to_string();
    let translations = json!({
        "quest": { "notifications": { "messages": {
            "questStarted": "¡Misión \"{title}\" iniciada!"
        } } }
    });

    let event = NotificationEvent::for_quest(NotificationEventType::QuestStarted, &started, now());
    assert_eq!(
        get_notification_message(&event, Some(&translations)),
        "¡Misión \"Dragon\" iniciada!"
    );

    let failed = NotificationEvent::for_quest(NotificationEventType::QuestFailed, &started, now());
    assert_eq!(
        get_notification_message(&failed, Some(&translations)),
        "Quest \"Dragon\" has failed. Don't give up!"
    );
}

#[test]
fn notifier_shows_only_enabled_events() {
    let preferences = NotificationPreferences {
        quest_failed: false,
        ..NotificationPreferences::all_in_app()
    };
    let mut notifier = QuestNotifier::new(profile(Some(preferences)), MemorySink::default());

    let mut won = quest("won", QuestStatus::Completed);
    won.title = "Win".to_string();
    let lost = quest("lost", QuestStatus::Failed);
    let events = vec![
        NotificationEvent::for_quest(NotificationEventType::QuestCompleted, &won, now()),
        NotificationEvent::for_quest(NotificationEventType::QuestFailed, &lost, now()),
    ];

    let shown = notifier.notify_all(&events).expect("notify");
    assert_eq!(shown, 1);

    let sink = notifier.into_sink();
    assert_eq!(sink.toasts.len(), 1);
    assert_eq!(sink.toasts[0].event_type, NotificationEventType::QuestCompleted);
    assert_eq!(sink.toasts[0].quest_id.as_deref(), Some("won"));
    assert_eq!(sink.toasts[0].message, "Congratulations! Quest \"Win\" completed!");
}

#[test]
fn notifier_without_preferences_is_silent() {
    let mut notifier = QuestNotifier::new(profile(None), MemorySink::default());
    let event = NotificationEvent::new(NotificationEventType::StreakAchieved, now()).with_days(3);

    assert!(!notifier.notify(&event).expect("notify"));
    assert!(notifier.sink().toasts.is_empty());
}

#[test]
fn notifier_skips_when_profile_cannot_be_read() {
    let workspace = support::Workspace::new();
    let missing = workspace.path().join("missing-profile.json");
    let mut notifier = QuestNotifier::new(FileProfileSource::new(missing), MemorySink::default());

    let event = NotificationEvent::for_quest(
        NotificationEventType::QuestStarted,
        &quest("q", QuestStatus::Active),
        now(),
    );
    assert!(!notifier.notify(&event).expect("notify"));
    assert!(notifier.sink().toasts.is_empty());
}

#[test]
fn notifier_reads_profile_file_with_translations() {
    let workspace = support::Workspace::new();
    let path = workspace.write_file(
        "profile.json",
        r#"{
            "displayName": "Ada",
            "notificationPreferences": {
                "questStarted": true,
                "channels": { "inApp": true }
            }
        }"#,
    );
    let translations = json!({
        "quest": { "notifications": { "messages": {
            "questStarted": "Go: {title}"
        } } }
    });
    let mut notifier = QuestNotifier::new(FileProfileSource::new(path), MemorySink::default())
        .with_translations(translations);

    let mut started = quest("q", QuestStatus::Active);
    started.title = "Climb".to_string();
    let event = NotificationEvent::for_quest(NotificationEventType::QuestStarted, &started, now());

    assert!(notifier.notify(&event).expect("notify"));
    assert_eq!(notifier.sink().toasts[0].message, "Go: Climb");
}
