//! Task board views and drag gestures through the command surface.

use momentum_flow_lib::commands::settings::settings_update;
use momentum_flow_lib::commands::task::{
    tasks_board, tasks_create, tasks_drag, tasks_list, tasks_set_status, BoardSnapshot,
};
use momentum_flow_lib::commands::AppState;
use momentum_flow_lib::db::DbPool;
use momentum_flow_lib::models::settings::BoardView;
use momentum_flow_lib::models::task::{Task, TaskInput, TaskStatus};
use momentum_flow_lib::services::reorder::DragGesture;
use momentum_flow_lib::services::settings_service::SettingsUpdateInput;
use tempfile::{tempdir, TempDir};

fn setup() -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("board.sqlite")).expect("db pool");
    (AppState::new(pool).expect("app state"), dir)
}

async fn create(state: &AppState, title: &str, urgent: bool, important: bool) -> Task {
    tasks_create(
        state,
        TaskInput {
            title: title.to_string(),
            is_urgent: urgent,
            is_important: important,
            ..Default::default()
        },
    )
    .await
    .expect("create")
    .expect("task")
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}

#[tokio::test]
async fn reorder_within_column_and_move_across() {
    let (state, _dir) = setup();
    let c = create(&state, "C", false, false).await;
    let b = create(&state, "B", false, false).await;
    let a = create(&state, "A", false, false).await;
    assert_eq!(titles(&tasks_list(&state).await.expect("list")), vec!["A", "B", "C"]);

    assert!(tasks_drag(&state, DragGesture::onto_item(a.id.clone(), c.id.clone()))
        .await
        .expect("drag"));
    assert_eq!(titles(&tasks_list(&state).await.expect("list")), vec!["B", "C", "A"]);

    assert!(tasks_drag(&state, DragGesture::onto_column(b.id.clone(), TaskStatus::InProgress))
        .await
        .expect("drag"));
    let tasks = tasks_list(&state).await.expect("list");
    assert_eq!(titles(&tasks), vec!["B", "C", "A"]);
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert_eq!(tasks[1].status, TaskStatus::Todo);

    assert!(!tasks_drag(&state, DragGesture::cancelled(c.id.clone()))
        .await
        .expect("drag"));
    assert!(!tasks_drag(&state, DragGesture::onto_item(c.id.clone(), c.id.clone()))
        .await
        .expect("drag"));
}

#[tokio::test]
async fn list_view_truncates_completed_per_settings() {
    let (state, _dir) = setup();
    for index in 0..5 {
        let task = create(&state, &format!("Done {index}"), false, false).await;
        tasks_set_status(&state, task.id, TaskStatus::Completed)
            .await
            .expect("status");
    }
    create(&state, "Open", false, false).await;

    match tasks_board(&state, Some(BoardView::List)).await.expect("board") {
        BoardSnapshot::List { columns } => {
            assert_eq!(columns.completed.len(), 3);
            assert_eq!(columns.todo.len(), 1);
        }
        other => panic!("unexpected view: {other:?}"),
    }

    settings_update(
        &state,
        SettingsUpdateInput {
            completed_preview_limit: Some(1),
            ..Default::default()
        },
    )
    .await
    .expect("settings");

    match tasks_board(&state, None).await.expect("board") {
        BoardSnapshot::List { columns } => assert_eq!(columns.completed.len(), 1),
        other => panic!("unexpected view: {other:?}"),
    }

    match tasks_board(&state, Some(BoardView::Kanban)).await.expect("board") {
        BoardSnapshot::Kanban { columns } => assert_eq!(columns.completed.len(), 5),
        other => panic!("unexpected view: {other:?}"),
    }
}

#[tokio::test]
async fn eisenhower_view_follows_flags_and_order() {
    let (state, _dir) = setup();
    create(&state, "Later", false, true).await;
    create(&state, "Now", true, true).await;
    create(&state, "Delegate", true, false).await;
    create(&state, "Drop", false, false).await;
    create(&state, "Also now", true, true).await;

    match tasks_board(&state, Some(BoardView::Eisenhower)).await.expect("board") {
        BoardSnapshot::Eisenhower { quadrants } => {
            assert_eq!(titles(&quadrants.urgent_important), vec!["Also now", "Now"]);
            assert_eq!(titles(&quadrants.important_not_urgent), vec!["Later"]);
            assert_eq!(titles(&quadrants.urgent_not_important), vec!["Delegate"]);
            assert_eq!(titles(&quadrants.neither), vec!["Drop"]);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[tokio::test]
async fn blank_titles_never_reach_the_board() {
    let (state, _dir) = setup();
    let created = tasks_create(&state, TaskInput::default()).await.expect("create");
    assert!(created.is_none());
    assert!(tasks_list(&state).await.expect("list").is_empty());
}
