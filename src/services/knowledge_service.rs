//! Second brain: knowledge cards with tags and links.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::knowledge::{CardLink, KnowledgeCard, KnowledgeCardDraft};
use crate::services::state::VersionedState;

/// `title: url` or a bare url. The title ends at the first colon followed by
/// whitespace, so the scheme separator of the url is never split.
static LINK_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<title>.+?):\s+)?(?P<url>[A-Za-z][A-Za-z0-9+.\-]*://\S+)$")
        .expect("valid link line regex")
});

pub fn parse_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in text.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// One link per line; lines without a url are dropped.
pub fn parse_links(text: &str) -> Vec<CardLink> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let Some(captures) = LINK_LINE_RE.captures(line) else {
                debug!(target: "app::knowledge", line, "dropping link line without a url");
                return None;
            };
            let url = captures.name("url")?.as_str().to_string();
            let title = captures
                .name("title")
                .map(|title| title.as_str().trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| url.clone());
            Some(CardLink { title, url })
        })
        .collect()
}

/// Case-insensitive substring over title and content, and every selected tag present.
pub fn filter_cards(cards: &[KnowledgeCard], query: &str, selected_tags: &[String]) -> Vec<KnowledgeCard> {
    let needle = query.trim().to_lowercase();
    cards
        .iter()
        .filter(|card| {
            needle.is_empty()
                || card.title.to_lowercase().contains(&needle)
                || card.content.to_lowercase().contains(&needle)
        })
        .filter(|card| selected_tags.iter().all(|tag| card.has_tag(tag)))
        .cloned()
        .collect()
}

pub struct KnowledgeService {
    cards: VersionedState<Vec<KnowledgeCard>>,
}

impl Default for KnowledgeService {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeService {
    pub fn new() -> Self {
        Self {
            cards: VersionedState::new("knowledge_cards", Vec::new()),
        }
    }

    pub fn list(&self) -> AppResult<Vec<KnowledgeCard>> {
        self.cards.snapshot()
    }

    /// Creates a card, or edits `editing_id` when given.
    ///
    /// A blank title or an unknown `editing_id` changes nothing.
    pub fn save_card(
        &self,
        editing_id: Option<&str>,
        draft: KnowledgeCardDraft,
    ) -> AppResult<Option<KnowledgeCard>> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let tags = parse_tags(&draft.tags_text);
        let links = parse_links(&draft.links_text);
        let mut saved = None;

        self.cards.update(|current| match editing_id {
            Some(id) => {
                let index = current.iter().position(|card| card.id == id)?;
                let card = KnowledgeCard {
                    title: title.to_string(),
                    content: draft.content.clone(),
                    tags: tags.clone(),
                    links: links.clone(),
                    updated_at: now,
                    ..current[index].clone()
                };
                let mut next = current.clone();
                next[index] = card.clone();
                saved = Some(card);
                Some(next)
            }
            None => {
                let card = KnowledgeCard {
                    id: Uuid::new_v4().to_string(),
                    title: title.to_string(),
                    content: draft.content.clone(),
                    tags: tags.clone(),
                    links: links.clone(),
                    created_at: now,
                    updated_at: now,
                };
                let mut next = Vec::with_capacity(current.len() + 1);
                next.push(card.clone());
                next.extend(current.iter().cloned());
                saved = Some(card);
                Some(next)
            }
        })?;

        if let Some(card) = &saved {
            info!(
                target: "app::knowledge",
                card_id = %card.id,
                edited = editing_id.is_some(),
                tags = card.tags.len(),
                links = card.links.len(),
                "knowledge card saved"
            );
        }
        Ok(saved)
    }

    pub fn delete_card(&self, id: &str) -> AppResult<bool> {
        let removed = self.cards.update(|current| {
            if !current.iter().any(|card| card.id == id) {
                return None;
            }
            Some(current.iter().filter(|card| card.id != id).cloned().collect())
        })?;

        if removed.is_some() {
            info!(target: "app::knowledge", card_id = %id, "knowledge card deleted");
        }
        Ok(removed.is_some())
    }

    pub fn filter(&self, query: &str, selected_tags: &[String]) -> AppResult<Vec<KnowledgeCard>> {
        Ok(filter_cards(&self.cards.snapshot()?, query, selected_tags))
    }

    /// Every tag in use, in first-seen order.
    pub fn all_tags(&self) -> AppResult<Vec<String>> {
        let mut tags: Vec<String> = Vec::new();
        for card in self.cards.snapshot()? {
            for tag in card.tags {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }
}
