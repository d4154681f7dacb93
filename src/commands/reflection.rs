use chrono::NaiveDate;

use crate::models::reflection::{EqCategory, EqReflection, EqReflectionItem};

use super::{AppState, CommandResult};

const DEFAULT_HISTORY_LIMIT: usize = 14;
const MAX_HISTORY_LIMIT: usize = 365;

pub async fn reflection_load(state: &AppState, date: NaiveDate) -> CommandResult<EqReflection> {
    Ok(state.reflections().load(date).await?)
}

pub async fn reflection_complete_item(
    state: &AppState,
    date: NaiveDate,
    category: EqCategory,
) -> CommandResult<EqReflection> {
    Ok(state.reflections().complete_item(date, category).await?)
}

pub async fn reflection_update_item(
    state: &AppState,
    date: NaiveDate,
    item: EqReflectionItem,
) -> CommandResult<EqReflection> {
    Ok(state.reflections().update_item(date, item).await?)
}

pub async fn reflection_save(state: &AppState, date: NaiveDate) -> CommandResult<EqReflection> {
    Ok(state.reflections().save_reflection(date).await?)
}

pub async fn reflection_history(
    state: &AppState,
    limit: Option<usize>,
) -> CommandResult<Vec<EqReflection>> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(state.reflections().history(limit).await?)
}
