//! Weekly and monthly tracker lifecycle.
//!
//! The free functions are pure: they take the current collection and return
//! a new one, leaving the input untouched. [`TrackerService`] owns the two
//! collections and gates every write on an active session.

use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::notice::Notice;
use crate::models::tracker::{SubItem, Tracker, TrackerFieldsUpdate, TrackerKind, WeekStart};
use crate::services::completion::completion_percentage;
use crate::services::link_service::{sync_weekly_items, LinkedTaskChannel};
use crate::services::notifier::NoticeQueue;
use crate::services::session::SessionProvider;
use crate::services::state::VersionedState;

/// Tracker for the period after the latest existing one of `kind`, or for the
/// period containing `today` when there is none.
pub fn create_next_period(
    kind: TrackerKind,
    existing: &[Tracker],
    today: NaiveDate,
    week_start: WeekStart,
) -> Tracker {
    let period_start = existing
        .iter()
        .filter(|tracker| tracker.kind == kind)
        .map(|tracker| tracker.period_start)
        .max()
        .and_then(|latest| kind.advance(latest))
        .unwrap_or_else(|| kind.period_start_of(today, week_start));

    Tracker {
        id: Uuid::new_v4().to_string(),
        kind,
        period_start,
        title: format!(
            "{} of {}",
            kind.period_label(),
            kind.format_period_start(period_start)
        ),
        description: String::new(),
        north_star: String::new(),
        reflection: String::new(),
        wins: String::new(),
        challenges: String::new(),
        linked_projects: Vec::new(),
        items: Vec::new(),
        completion_percentage: 0.0,
    }
}

/// Copy of `trackers` with `f` applied to the tracker `tracker_id`.
fn map_tracker<F>(trackers: &[Tracker], tracker_id: &str, f: F) -> Vec<Tracker>
where
    F: FnOnce(&mut Tracker),
{
    let mut next = trackers.to_vec();
    if let Some(tracker) = next.iter_mut().find(|tracker| tracker.id == tracker_id) {
        f(tracker);
    }
    next
}

pub fn toggle_sub_item(trackers: &[Tracker], tracker_id: &str, item_id: &str) -> Vec<Tracker> {
    map_tracker(trackers, tracker_id, |tracker| {
        if let Some(item) = tracker.items.iter_mut().find(|item| item.id == item_id) {
            item.completed = !item.completed;
            tracker.completion_percentage = completion_percentage(&tracker.items);
        }
    })
}

pub fn add_sub_item(trackers: &[Tracker], tracker_id: &str, title: &str) -> Vec<Tracker> {
    let title = title.trim();
    if title.is_empty() {
        return trackers.to_vec();
    }

    map_tracker(trackers, tracker_id, |tracker| {
        tracker.items.push(SubItem {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            source_task_id: None,
        });
        tracker.completion_percentage = completion_percentage(&tracker.items);
    })
}

pub fn update_tracker_fields(
    trackers: &[Tracker],
    tracker_id: &str,
    patch: &TrackerFieldsUpdate,
) -> Vec<Tracker> {
    if patch.is_empty() {
        return trackers.to_vec();
    }

    map_tracker(trackers, tracker_id, |tracker| {
        if let Some(title) = patch.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                tracker.title = title.to_string();
            }
        }
        if let Some(description) = &patch.description {
            tracker.description = description.clone();
        }
        if let Some(north_star) = &patch.north_star {
            tracker.north_star = north_star.clone();
        }
        if let Some(reflection) = &patch.reflection {
            tracker.reflection = reflection.clone();
        }
        if let Some(wins) = &patch.wins {
            tracker.wins = wins.clone();
        }
        if let Some(challenges) = &patch.challenges {
            tracker.challenges = challenges.clone();
        }
        if let Some(linked_projects) = &patch.linked_projects {
            tracker.linked_projects = linked_projects.clone();
        }
    })
}

/// Most recent tracker by period start.
pub fn most_recent(trackers: &[Tracker]) -> Option<&Tracker> {
    trackers.iter().max_by_key(|tracker| tracker.period_start)
}

pub struct TrackerService {
    weekly: VersionedState<Vec<Tracker>>,
    monthly: VersionedState<Vec<Tracker>>,
    week_start: RwLock<WeekStart>,
    session: Arc<dyn SessionProvider>,
    notices: Arc<NoticeQueue>,
    linked: Arc<LinkedTaskChannel>,
}

impl TrackerService {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        notices: Arc<NoticeQueue>,
        linked: Arc<LinkedTaskChannel>,
        week_start: WeekStart,
    ) -> Self {
        Self {
            weekly: VersionedState::new("weekly_trackers", Vec::new()),
            monthly: VersionedState::new("monthly_trackers", Vec::new()),
            week_start: RwLock::new(week_start),
            session,
            notices,
            linked,
        }
    }

    fn state(&self, kind: TrackerKind) -> &VersionedState<Vec<Tracker>> {
        match kind {
            TrackerKind::Weekly => &self.weekly,
            TrackerKind::Monthly => &self.monthly,
        }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
            .read()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    pub fn set_week_start(&self, week_start: WeekStart) {
        if let Ok(mut guard) = self.week_start.write() {
            *guard = week_start;
        }
    }

    pub fn list(&self, kind: TrackerKind) -> AppResult<Vec<Tracker>> {
        let trackers = self.state(kind).snapshot()?;
        debug!(target: "app::tracker", kind = %kind, count = trackers.len(), "listing trackers");
        Ok(trackers)
    }

    pub fn most_recent(&self, kind: TrackerKind) -> AppResult<Option<Tracker>> {
        Ok(most_recent(&self.state(kind).snapshot()?).cloned())
    }

    fn require_session(&self, action: &str) -> AppResult<String> {
        match self.session.current_user() {
            Some(user_id) => Ok(user_id),
            None => {
                self.notices.push(Notice::authentication_required(format!(
                    "Please sign in to {action}"
                )));
                Err(AppError::unauthenticated(action))
            }
        }
    }

    /// Replaces the collection only if `f` changed it; returns the current one.
    fn apply<F>(&self, kind: TrackerKind, f: F) -> AppResult<Vec<Tracker>>
    where
        F: FnOnce(&[Tracker]) -> Vec<Tracker>,
    {
        let state = self.state(kind);
        let changed = state.update(|current| {
            let next = f(current.as_slice());
            (next != *current).then_some(next)
        })?;
        match changed {
            Some(next) => Ok(next),
            None => state.snapshot(),
        }
    }

    pub fn create_period(&self, kind: TrackerKind, today: NaiveDate) -> AppResult<Tracker> {
        let user_id = self.require_session(&format!("create a {kind} tracker"))?;
        let week_start = self.week_start();

        let mut created = None;
        self.apply(kind, |current| {
            let tracker = create_next_period(kind, current, today, week_start);
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(tracker.clone());
            next.extend_from_slice(current);
            created = Some(tracker);
            next
        })?;

        let tracker = created.ok_or_else(|| AppError::other("tracker was not created"))?;
        info!(
            target: "app::tracker",
            %user_id,
            kind = %kind,
            tracker_id = %tracker.id,
            period_start = %tracker.period_start,
            "tracker created"
        );
        Ok(tracker)
    }

    pub fn toggle_item(
        &self,
        kind: TrackerKind,
        tracker_id: &str,
        item_id: &str,
    ) -> AppResult<Vec<Tracker>> {
        self.require_session("update a tracker")?;
        let trackers = self.apply(kind, |current| toggle_sub_item(current, tracker_id, item_id))?;
        info!(target: "app::tracker", kind = %kind, %tracker_id, %item_id, "tracker item toggled");
        Ok(trackers)
    }

    pub fn add_item(&self, kind: TrackerKind, tracker_id: &str, title: &str) -> AppResult<Vec<Tracker>> {
        self.require_session("update a tracker")?;
        let trackers = self.apply(kind, |current| add_sub_item(current, tracker_id, title))?;
        info!(target: "app::tracker", kind = %kind, %tracker_id, "tracker item added");
        Ok(trackers)
    }

    pub fn update_fields(
        &self,
        kind: TrackerKind,
        tracker_id: &str,
        patch: &TrackerFieldsUpdate,
    ) -> AppResult<Vec<Tracker>> {
        self.require_session("update a tracker")?;
        let trackers =
            self.apply(kind, |current| update_tracker_fields(current, tracker_id, patch))?;
        info!(target: "app::tracker", kind = %kind, %tracker_id, "tracker fields updated");
        Ok(trackers)
    }

    /// Pulls weekly-linked tasks into the most recent weekly tracker.
    ///
    /// Silently skipped without a session or without any weekly tracker.
    pub fn sync_linked_tasks(&self) -> AppResult<Option<Tracker>> {
        if self.session.current_user().is_none() {
            debug!(target: "app::link", "skipping linked task sync without a session");
            return Ok(None);
        }

        let linked = self.linked.snapshot();
        let mut notices = Vec::new();
        let mut synced = None;

        self.weekly.update(|current| {
            let target = most_recent(current)?;
            let (tracker, emitted) = sync_weekly_items(target, &linked)?;
            notices = emitted;
            let next = current
                .iter()
                .map(|existing| {
                    if existing.id == tracker.id {
                        tracker.clone()
                    } else {
                        existing.clone()
                    }
                })
                .collect();
            synced = Some(tracker);
            Some(next)
        })?;

        self.notices.extend(notices);
        Ok(synced)
    }
}
