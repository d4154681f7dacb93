use crate::models::settings::AppSettings;
use crate::services::settings_service::SettingsUpdateInput;

use super::{run_blocking, AppState, CommandResult};

pub async fn settings_get(state: &AppState) -> CommandResult<AppSettings> {
    let app_state = state.clone();
    run_blocking(move || app_state.settings().get()).await
}

pub async fn settings_update(
    state: &AppState,
    input: SettingsUpdateInput,
) -> CommandResult<AppSettings> {
    let app_state = state.clone();
    let settings = run_blocking(move || app_state.settings().update(input)).await?;
    state.trackers().set_week_start(settings.week_start);
    Ok(settings)
}

pub async fn settings_reset(state: &AppState) -> CommandResult<AppSettings> {
    let app_state = state.clone();
    let settings = run_blocking(move || app_state.settings().reset()).await?;
    state.trackers().set_week_start(settings.week_start);
    Ok(settings)
}
