//! Daily tasks linked to the weekly tracker, end to end through the command surface.

use chrono::NaiveDate;
use momentum_flow_lib::commands::session::{notices_drain, session_sign_in, session_sign_out};
use momentum_flow_lib::commands::task::{tasks_complete, tasks_create};
use momentum_flow_lib::commands::tracker::{
    trackers_create_period, trackers_list, trackers_toggle_item,
};
use momentum_flow_lib::commands::AppState;
use momentum_flow_lib::db::DbPool;
use momentum_flow_lib::models::task::{LinkedTimeframe, TaskInput, TaskStatus};
use momentum_flow_lib::models::tracker::TrackerKind;
use tempfile::{tempdir, TempDir};

fn setup() -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("linking.sqlite")).expect("db pool");
    let state = AppState::new(pool).expect("app state");
    (state, dir)
}

fn week_of_june_3() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 6, 3)
}

fn weekly_input(title: &str) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        linked_timeframes: [LinkedTimeframe::Weekly].into_iter().collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn draft_report_mirrors_into_weekly_tracker() {
    let (state, _dir) = setup();
    session_sign_in(&state, "user-1".into()).await.expect("sign in");
    let week = trackers_create_period(&state, TrackerKind::Weekly, week_of_june_3())
        .await
        .expect("weekly tracker");
    assert_eq!(week.title, "Week of Jun 3, 2024");

    let task = tasks_create(&state, weekly_input("Draft report"))
        .await
        .expect("create")
        .expect("task");

    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    let item = trackers[0].find_linked_item(&task.id).expect("mirrored item");
    assert_eq!(item.title, "Draft report");
    assert!(!item.completed);
    assert_eq!(trackers[0].completion_percentage, 0.0);

    tasks_complete(&state, task.id.clone()).await.expect("complete");

    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    assert_eq!(trackers[0].items.len(), 1);
    assert!(trackers[0].find_linked_item(&task.id).expect("item").completed);
    assert_eq!(trackers[0].completion_percentage, 100.0);

    let titles: Vec<String> = notices_drain(&state)
        .await
        .expect("notices")
        .into_iter()
        .map(|notice| notice.title)
        .collect();
    assert_eq!(
        titles,
        vec!["Task Linked", "Task Added", "Task Completed", "Task Updated"]
    );
}

#[tokio::test]
async fn toggling_weekly_item_leaves_source_task_alone() {
    let (state, _dir) = setup();
    session_sign_in(&state, "user-1".into()).await.expect("sign in");
    let week = trackers_create_period(&state, TrackerKind::Weekly, week_of_june_3())
        .await
        .expect("weekly tracker");
    let task = tasks_create(&state, weekly_input("Review budget"))
        .await
        .expect("create")
        .expect("task");

    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    let item_id = trackers[0].find_linked_item(&task.id).expect("item").id.clone();
    let toggled = trackers_toggle_item(&state, TrackerKind::Weekly, week.id.clone(), item_id)
        .await
        .expect("toggle");
    assert!(toggled[0].items[0].completed);

    let tasks = state.tasks().tasks().expect("tasks");
    assert_eq!(tasks[0].status, TaskStatus::Todo);
}

#[tokio::test]
async fn tasks_created_signed_out_sync_after_sign_in() {
    let (state, _dir) = setup();
    session_sign_in(&state, "user-1".into()).await.expect("sign in");
    trackers_create_period(&state, TrackerKind::Weekly, week_of_june_3())
        .await
        .expect("weekly tracker");
    session_sign_out(&state).await.expect("sign out");

    let task = tasks_create(&state, weekly_input("Offline idea"))
        .await
        .expect("create")
        .expect("task");
    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    assert!(trackers[0].find_linked_item(&task.id).is_none());

    session_sign_in(&state, "user-1".into()).await.expect("sign in");
    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    assert!(trackers[0].find_linked_item(&task.id).is_some());
}

#[tokio::test]
async fn unlinked_tasks_do_not_reach_trackers() {
    let (state, _dir) = setup();
    session_sign_in(&state, "user-1".into()).await.expect("sign in");
    trackers_create_period(&state, TrackerKind::Weekly, week_of_june_3())
        .await
        .expect("weekly tracker");

    tasks_create(
        &state,
        TaskInput {
            title: "Monthly only".into(),
            linked_timeframes: [LinkedTimeframe::Monthly].into_iter().collect(),
            ..Default::default()
        },
    )
    .await
    .expect("create");

    let trackers = trackers_list(&state, TrackerKind::Weekly).await.expect("list");
    assert!(trackers[0].items.is_empty());
}
