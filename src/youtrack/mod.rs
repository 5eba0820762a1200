use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::linking::IssueTracker;
use crate::model::{Field, Issue, WorkLog};
use crate::youtrack::model::{DurationReq, IssueResp, WorkItemReq, WorkTypeReq, ISSUE_FIELDS};

pub mod model;

#[derive(Clone)]
pub struct YouTrackClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for YouTrackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTrackClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YouTrackClient {
    pub fn new(
        mut base_url: Url,
        token: String,
        accept_invalid_certs: bool,
        timeout: Duration,
    ) -> Result<Self> {
        // YouTrack may live under a path prefix; keep it when joining.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        if accept_invalid_certs {
            warn!(%base_url, "TLS certificate verification disabled for YouTrack");
        }
        let http = Client::builder()
            .user_agent(concat!("trackbridge/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(timeout)
            .build()
            .context("failed to build YouTrack HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid YouTrack path {path}"))
    }

    pub fn build_issue_request(&self, issue_id: &str) -> Result<reqwest::Request> {
        self.http
            .get(self.endpoint(&format!("api/issues/{issue_id}"))?)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[("fields", ISSUE_FIELDS)])
            .build()
            .context("failed to build YouTrack request")
    }

    pub fn build_work_item_request(&self, work_log: &WorkLog) -> Result<reqwest::Request> {
        let body = build_work_item(work_log);
        self.http
            .post(self.endpoint(&format!(
                "api/issues/{}/timeTracking/workItems",
                work_log.issue_id
            ))?)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&body)
            .build()
            .context("failed to build YouTrack request")
    }
}

#[async_trait]
impl IssueTracker for YouTrackClient {
    #[instrument(skip(self))]
    async fn resolve_issue(&self, issue_id: &str) -> Result<Issue> {
        let request = self.build_issue_request(issue_id)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach YouTrack")?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("issue {} not found", issue_id));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("youtrack error {}: {}", status, body));
        }

        let payload: IssueResp = res.json().await.context("invalid YouTrack issue response")?;
        debug!(fields = payload.custom_fields.len(), "resolved issue");
        Ok(issue_from_response(payload))
    }

    #[instrument(skip_all, fields(issue_id = %work_log.issue_id))]
    async fn submit_work_log(&self, work_log: &WorkLog) -> Result<()> {
        let request = self.build_work_item_request(work_log)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach YouTrack")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("no work item created ({}): {}", status, body));
        }
        info!(minutes = work_log.duration_minutes, "work item created");
        Ok(())
    }
}

pub fn build_work_item(work_log: &WorkLog) -> WorkItemReq {
    let work_type = work_log.work_type.trim();
    WorkItemReq {
        date: work_log.date.timestamp_millis(),
        duration: DurationReq {
            minutes: work_log.duration_minutes,
        },
        text: work_log.description.clone(),
        work_type: (!work_type.is_empty()).then(|| WorkTypeReq {
            name: work_type.to_string(),
        }),
    }
}

/// Flattens an issue response into ordered name/value fields.
pub fn issue_from_response(resp: IssueResp) -> Issue {
    let mut fields = Vec::new();
    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.push(Field {
                name: name.to_string(),
                value,
            });
        }
    };
    push("id", resp.id_readable);
    push("summary", resp.summary);
    push("description", resp.description);
    for custom in resp.custom_fields {
        push(&custom.name, field_text(&custom.value));
    }
    Issue { fields }
}

/// Renders a custom field value as text. Unknown shapes yield `None`.
pub fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => ["name", "presentation", "text", "minutes"]
            .iter()
            .find_map(|key| map.get(*key).and_then(field_text)),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_text).collect();
            Some(parts.join(", "))
        }
    }
}
