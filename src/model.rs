use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A board card together with the whole minutes it spent in the doing list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: String,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
    pub date: DateTime<Utc>,
}

/// A single named issue field as reported by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Snapshot of a tracker issue. Field order is the order the tracker reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub fields: Vec<Field>,
}

impl Issue {
    pub fn find_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardIssueLink {
    pub card: Card,
    pub issue: Option<Issue>,
}

/// A manually entered time record, as submitted from the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeLogEntry {
    pub title: String,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "worktype", default)]
    pub work_type: String,
}

/// A time record bound to an issue id, ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkLog {
    pub issue_id: String,
    pub duration_minutes: i64,
    pub description: String,
    pub work_type: String,
    pub date: DateTime<Utc>,
}

impl WorkLog {
    pub fn from_entry(issue_id: String, entry: &TimeLogEntry) -> Self {
        Self {
            issue_id,
            duration_minutes: entry.duration_minutes,
            description: entry.description.clone(),
            work_type: entry.work_type.clone(),
            date: entry.date,
        }
    }
}
