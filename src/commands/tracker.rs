use chrono::{Local, NaiveDate};

use crate::models::tracker::{Tracker, TrackerFieldsUpdate, TrackerKind};

use super::{AppState, CommandResult};

pub async fn trackers_list(state: &AppState, kind: TrackerKind) -> CommandResult<Vec<Tracker>> {
    Ok(state.trackers().list(kind)?)
}

/// Rolls forward to the next period; `today` defaults to the local date.
pub async fn trackers_create_period(
    state: &AppState,
    kind: TrackerKind,
    today: Option<NaiveDate>,
) -> CommandResult<Tracker> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let tracker = state.trackers().create_period(kind, today)?;
    if kind == TrackerKind::Weekly {
        state.propagate_linked_tasks()?;
    }
    Ok(tracker)
}

pub async fn trackers_toggle_item(
    state: &AppState,
    kind: TrackerKind,
    tracker_id: String,
    item_id: String,
) -> CommandResult<Vec<Tracker>> {
    Ok(state.trackers().toggle_item(kind, &tracker_id, &item_id)?)
}

pub async fn trackers_add_item(
    state: &AppState,
    kind: TrackerKind,
    tracker_id: String,
    title: String,
) -> CommandResult<Vec<Tracker>> {
    Ok(state.trackers().add_item(kind, &tracker_id, &title)?)
}

pub async fn trackers_update_fields(
    state: &AppState,
    kind: TrackerKind,
    tracker_id: String,
    patch: TrackerFieldsUpdate,
) -> CommandResult<Vec<Tracker>> {
    Ok(state.trackers().update_fields(kind, &tracker_id, &patch)?)
}

pub async fn trackers_sync_linked(state: &AppState) -> CommandResult<Option<Tracker>> {
    Ok(state.trackers().sync_linked_tasks()?)
}
