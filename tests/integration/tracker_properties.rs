//! Properties of the completion calculator and tracker lifecycle over the public API.

use chrono::NaiveDate;
use momentum_flow_lib::commands::settings::settings_update;
use momentum_flow_lib::commands::session::session_sign_in;
use momentum_flow_lib::commands::tracker::trackers_create_period;
use momentum_flow_lib::commands::AppState;
use momentum_flow_lib::db::DbPool;
use momentum_flow_lib::models::tracker::{SubItem, Tracker, TrackerKind, WeekStart};
use momentum_flow_lib::services::completion::completion_percentage;
use momentum_flow_lib::services::settings_service::SettingsUpdateInput;
use momentum_flow_lib::services::tracker_service::{
    add_sub_item, create_next_period, toggle_sub_item,
};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn tracker_with_items(count: usize, completed: usize) -> Tracker {
    let mut tracker = create_next_period(TrackerKind::Weekly, &[], date(2024, 6, 3), WeekStart::Monday);
    tracker.items = (0..count)
        .map(|index| SubItem {
            id: format!("item-{index}"),
            title: format!("Item {index}"),
            completed: index < completed,
            source_task_id: None,
        })
        .collect();
    tracker.completion_percentage = completion_percentage(&tracker.items);
    tracker
}

#[test]
fn completion_is_bounded_and_zero_when_empty() {
    assert_eq!(completion_percentage(&Vec::<SubItem>::new()), 0.0);
    for count in 1..=10 {
        for completed in 0..=count {
            let value = tracker_with_items(count, completed).completion_percentage;
            assert!((0.0..=100.0).contains(&value));
        }
    }
}

#[test]
fn toggle_adds_one_share_and_toggling_back_restores() {
    for count in 1..=8 {
        let tracker = tracker_with_items(count, 0);
        let trackers = vec![tracker.clone()];
        let last = format!("item-{}", count - 1);

        let toggled = toggle_sub_item(&trackers, &tracker.id, &last);
        let expected = 100.0 / count as f64;
        assert!((toggled[0].completion_percentage - expected).abs() < 1e-9);

        let restored = toggle_sub_item(&toggled, &tracker.id, &last);
        assert_eq!(restored, trackers);
    }
}

#[test]
fn first_and_following_periods() {
    let week = create_next_period(TrackerKind::Weekly, &[], date(2024, 6, 3), WeekStart::Monday);
    assert_eq!(week.period_start, date(2024, 6, 3));

    let sunday = create_next_period(TrackerKind::Weekly, &[], date(2024, 6, 9), WeekStart::Monday);
    assert_eq!(sunday.period_start, date(2024, 6, 3));

    let may = Tracker {
        period_start: date(2024, 5, 1),
        ..create_next_period(TrackerKind::Monthly, &[], date(2024, 5, 1), WeekStart::Monday)
    };
    let june = create_next_period(TrackerKind::Monthly, &[may], date(2024, 9, 15), WeekStart::Monday);
    assert_eq!(june.period_start, date(2024, 6, 1));
    assert_eq!(june.title, "Month of June 2024");
    assert!(june.items.is_empty());
}

#[test]
fn month_roll_forward_crosses_year_end() {
    let december = create_next_period(TrackerKind::Monthly, &[], date(2024, 12, 20), WeekStart::Monday);
    let january = create_next_period(TrackerKind::Monthly, &[december], date(2024, 12, 20), WeekStart::Monday);
    assert_eq!(january.period_start, date(2025, 1, 1));
    assert_eq!(january.title, "Month of January 2025");
}

#[test]
fn unknown_ids_return_equal_collections() {
    let trackers = vec![tracker_with_items(3, 1), tracker_with_items(2, 2)];
    assert_eq!(toggle_sub_item(&trackers, "nope", "item-0"), trackers);
    assert_eq!(toggle_sub_item(&trackers, &trackers[0].id, "nope"), trackers);
    assert_eq!(add_sub_item(&trackers, "nope", "Extra"), trackers);
}

#[test]
fn add_item_appends_incomplete_and_recomputes() {
    let trackers = vec![tracker_with_items(1, 1)];
    let next = add_sub_item(&trackers, &trackers[0].id, "  Outline chapter  ");
    let added = next[0].items.last().expect("added item");
    assert_eq!(added.title, "Outline chapter");
    assert!(!added.completed);
    assert_eq!(next[0].completion_percentage, 50.0);
}

#[tokio::test]
async fn week_start_setting_shapes_new_periods() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("trackers.sqlite")).expect("db pool");
    let state = AppState::new(pool).expect("app state");
    session_sign_in(&state, "user-1".into()).await.expect("sign in");

    settings_update(
        &state,
        SettingsUpdateInput {
            week_start: Some("sunday".into()),
            ..Default::default()
        },
    )
    .await
    .expect("settings");

    let tracker = trackers_create_period(&state, TrackerKind::Weekly, Some(date(2024, 6, 5)))
        .await
        .expect("tracker");
    assert_eq!(tracker.period_start, date(2024, 6, 2));
    assert_eq!(tracker.title, "Week of Jun 2, 2024");
}
