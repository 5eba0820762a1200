use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::linking::BoardSource;
use crate::model::Card;
use crate::trello::model::{TrelloAction, TrelloCard};

pub mod model;

const TRELLO_API_BASE: &str = "https://api.trello.com/";

/// Action types that put a card into the list named in `data.list`.
const PLACING_ACTIONS: &[&str] = &[
    "createCard",
    "copyCard",
    "moveCardToBoard",
    "convertToCardFromCheckItem",
];

const ACTION_FILTER: &str =
    "createCard,copyCard,moveCardToBoard,convertToCardFromCheckItem,updateCard:idList";

/// Trello caps `limit` on the actions endpoint at 1000.
const ACTION_PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct TrelloClient {
    http: Client,
    base_url: Url,
    api_key: String,
    api_token: String,
    action_page_size: usize,
}

impl fmt::Debug for TrelloClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrelloClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// A card entering a list at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPlacement {
    pub list_name: String,
    pub at: DateTime<Utc>,
}

impl TrelloClient {
    pub fn new(api_key: String, api_token: String, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(TRELLO_API_BASE).context("invalid default Trello URL")?;
        Self::with_base_url(api_key, api_token, base_url, timeout)
    }

    pub fn with_base_url(
        api_key: String,
        api_token: String,
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("trackbridge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build Trello HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
            api_token,
            action_page_size: ACTION_PAGE_SIZE,
        })
    }

    /// Overrides how many actions are requested per page.
    pub fn with_action_page_size(mut self, page_size: usize) -> Self {
        self.action_page_size = page_size.clamp(1, ACTION_PAGE_SIZE);
        self
    }

    pub fn build_request(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(path)
            .with_context(|| format!("invalid Trello path {path}"))?;
        self.http
            .get(endpoint)
            .query(&[("key", self.api_key.as_str()), ("token", self.api_token.as_str())])
            .query(query)
            .build()
            .context("failed to build Trello request")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.build_request(path, query)?;
        debug!(path, "sending trello request");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Trello")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("trello error {}: {}", status, body));
        }
        res.json::<T>()
            .await
            .with_context(|| format!("invalid Trello response for {path}"))
    }

    pub async fn board_cards(&self, board_id: &str) -> Result<Vec<TrelloCard>> {
        self.get_json(&format!("1/boards/{board_id}/cards"), &[("fields", "name,desc")])
            .await
    }

    /// Every list placement in the card's history, following `before=` pages
    /// until Trello returns a short page.
    pub async fn card_list_placements(&self, card_id: &str) -> Result<Vec<ListPlacement>> {
        let path = format!("1/cards/{card_id}/actions");
        let limit = self.action_page_size.to_string();
        let mut placements = Vec::new();
        let mut before: Option<String> = None;
        loop {
            let page: Vec<TrelloAction> = {
                let mut query = vec![("filter", ACTION_FILTER), ("limit", limit.as_str())];
                if let Some(id) = before.as_deref() {
                    query.push(("before", id));
                }
                self.get_json(&path, &query).await?
            };
            placements.extend(page.iter().filter_map(list_placement));
            if page.len() < self.action_page_size {
                break;
            }
            // Pages come newest first; continue from the oldest action seen.
            match page.last() {
                Some(oldest) if !oldest.id.is_empty() => before = Some(oldest.id.clone()),
                _ => break,
            }
            debug!(card_id, before = ?before, "fetching older card actions");
        }
        Ok(placements)
    }
}

#[async_trait]
impl BoardSource for TrelloClient {
    #[instrument(skip(self))]
    async fn get_cards(&self, board_id: &str, list_name: &str) -> Result<Vec<Card>> {
        let now = Utc::now();
        let mut cards = Vec::new();
        for card in self.board_cards(board_id).await? {
            let placements = self
                .card_list_placements(&card.id)
                .await
                .with_context(|| format!("failed to fetch actions for card {}", card.id))?;
            if current_list(&placements) != Some(list_name) {
                continue;
            }
            let date = card_created_at(&card.id)
                .ok_or_else(|| anyhow!("card id {} carries no creation timestamp", card.id))?;
            cards.push(Card {
                title: card.name,
                description: card.desc,
                duration_minutes: minutes_in_list(placements, list_name, now),
                date,
            });
        }
        debug!(count = cards.len(), "collected cards in list");
        Ok(cards)
    }
}

/// Maps an action to the list it put the card in, if it moved the card at all.
pub fn list_placement(action: &TrelloAction) -> Option<ListPlacement> {
    let list = match action.typ.as_str() {
        "updateCard" => action.data.list_after.as_ref(),
        typ if PLACING_ACTIONS.contains(&typ) => action.data.list.as_ref(),
        _ => None,
    };
    let list = list?;
    Some(ListPlacement {
        list_name: list.name.clone(),
        at: action.date,
    })
}

/// The list the card sits in now: the one named by its latest placement.
pub fn current_list(placements: &[ListPlacement]) -> Option<&str> {
    placements
        .iter()
        .max_by_key(|p| p.at)
        .map(|p| p.list_name.as_str())
}

/// Whole minutes spent in `list_name`. Each placement lasts until the next
/// one; the latest lasts until `now`.
pub fn minutes_in_list(mut placements: Vec<ListPlacement>, list_name: &str, now: DateTime<Utc>) -> i64 {
    placements.sort_by_key(|p| p.at);
    let ends = placements
        .iter()
        .skip(1)
        .map(|p| p.at)
        .chain(std::iter::once(now));
    placements
        .iter()
        .zip(ends)
        .filter(|(p, _)| p.list_name == list_name)
        .map(|(p, end)| (end - p.at).num_seconds().max(0))
        .sum::<i64>()
        / 60
}

/// Trello ids start with the creation time as 8 hex digits of Unix seconds.
pub fn card_created_at(card_id: &str) -> Option<DateTime<Utc>> {
    let secs = u32::from_str_radix(card_id.get(..8)?, 16).ok()?;
    Utc.timestamp_opt(i64::from(secs), 0).single()
}
