use serde::Deserialize;

use crate::models::knowledge::{KnowledgeCard, KnowledgeCardDraft};

use super::{AppState, CommandResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeFilterPayload {
    pub query: String,
    pub tags: Vec<String>,
}

pub async fn knowledge_list(state: &AppState) -> CommandResult<Vec<KnowledgeCard>> {
    Ok(state.knowledge().list()?)
}

pub async fn knowledge_save(
    state: &AppState,
    editing_id: Option<String>,
    draft: KnowledgeCardDraft,
) -> CommandResult<Option<KnowledgeCard>> {
    Ok(state.knowledge().save_card(editing_id.as_deref(), draft)?)
}

pub async fn knowledge_delete(state: &AppState, id: String) -> CommandResult<bool> {
    Ok(state.knowledge().delete_card(&id)?)
}

pub async fn knowledge_filter(
    state: &AppState,
    payload: KnowledgeFilterPayload,
) -> CommandResult<Vec<KnowledgeCard>> {
    Ok(state.knowledge().filter(&payload.query, &payload.tags)?)
}

pub async fn knowledge_tags(state: &AppState) -> CommandResult<Vec<String>> {
    Ok(state.knowledge().all_tags()?)
}
