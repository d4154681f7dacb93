use tracing::info;

use crate::models::notice::Notice;
use crate::services::session::SessionProvider;

use super::{AppState, CommandResult};

pub async fn session_sign_in(state: &AppState, user_id: String) -> CommandResult<()> {
    state.session().sign_in(user_id);
    state.propagate_linked_tasks()?;
    Ok(())
}

pub async fn session_sign_out(state: &AppState) -> CommandResult<()> {
    state.session().sign_out();
    state.reflections().clear()?;
    info!(target: "app::command", "signed out");
    Ok(())
}

pub async fn session_current_user(state: &AppState) -> CommandResult<Option<String>> {
    Ok(state.session().current_user())
}

/// Notices raised since the last call, oldest first.
pub async fn notices_drain(state: &AppState) -> CommandResult<Vec<Notice>> {
    Ok(state.notices().drain())
}
