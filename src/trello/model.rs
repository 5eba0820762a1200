use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct TrelloCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Deserialize, Debug)]
pub struct TrelloAction {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub data: ActionData,
}

#[derive(Deserialize, Debug, Default)]
pub struct ActionData {
    pub list: Option<ListRef>,
    #[serde(rename = "listAfter")]
    pub list_after: Option<ListRef>,
}

#[derive(Deserialize, Debug)]
pub struct ListRef {
    #[serde(default)]
    pub name: String,
}
