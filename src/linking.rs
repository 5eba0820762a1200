//! Card to issue linking and work-log reconciliation.
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::extractor::IssueIdExtractor;
use crate::model::{Card, CardIssueLink, Issue, TimeLogEntry, WorkLog};

/// Source of cards sitting on a board, with their time spent in a list.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn get_cards(&self, board_id: &str, list_name: &str) -> Result<Vec<Card>>;
}

/// Issue tracker that can describe issues and record time against them.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn resolve_issue(&self, issue_id: &str) -> Result<Issue>;

    async fn submit_work_log(&self, work_log: &WorkLog) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to fetch cards from board")]
    Board(#[source] anyhow::Error),
    #[error("failed to resolve issue {issue_id}")]
    Resolve {
        issue_id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to submit work log for {issue_id} after {submitted} submitted")]
    Submit {
        issue_id: String,
        submitted: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Outcome of a save run that reached the end of the batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SaveReport {
    pub submitted: usize,
    pub skipped: usize,
    /// Entries whose title carried no issue reference, in input order.
    pub unresolved: Vec<TimeLogEntry>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Clone)]
pub struct LinkingEngine {
    board: Arc<dyn BoardSource>,
    tracker: Arc<dyn IssueTracker>,
    extractor: Arc<dyn IssueIdExtractor>,
}

impl LinkingEngine {
    pub fn new(
        board: Arc<dyn BoardSource>,
        tracker: Arc<dyn IssueTracker>,
        extractor: Arc<dyn IssueIdExtractor>,
    ) -> Self {
        Self {
            board,
            tracker,
            extractor,
        }
    }

    /// Lists every card of `list_name` with the issue its title points at.
    ///
    /// A title without a reference yields a link with no issue. A reference
    /// the tracker cannot resolve aborts the whole listing.
    #[instrument(skip(self))]
    pub async fn get_linked_cards(
        &self,
        board_id: &str,
        list_name: &str,
    ) -> Result<Vec<CardIssueLink>, LinkError> {
        let cards = self
            .board
            .get_cards(board_id, list_name)
            .await
            .map_err(LinkError::Board)?;
        debug!(count = cards.len(), "fetched cards");

        let mut links = Vec::with_capacity(cards.len());
        for card in cards {
            let issue = match self.extractor.extract(&card.title) {
                Some(issue_id) => {
                    let issue = self.tracker.resolve_issue(&issue_id).await.map_err(|source| {
                        warn!(issue_id = %issue_id, "issue referenced by card could not be resolved");
                        LinkError::Resolve { issue_id: issue_id.clone(), source }
                    })?;
                    Some(issue)
                }
                None => None,
            };
            links.push(CardIssueLink { card, issue });
        }

        Ok(links)
    }

    /// Submits every entry that references an issue and has a positive duration.
    ///
    /// Stops at the first tracker failure; entries submitted before it stay
    /// submitted. Entries without a reference come back in the report.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn save_worklogs(&self, entries: Vec<TimeLogEntry>) -> Result<SaveReport, LinkError> {
        let mut report = SaveReport::default();
        let mut work_logs = Vec::new();

        for entry in entries {
            match self.extractor.extract(&entry.title) {
                Some(issue_id) => work_logs.push(WorkLog::from_entry(issue_id, &entry)),
                None => report.unresolved.push(entry),
            }
        }

        for work_log in &work_logs {
            if work_log.duration_minutes <= 0 {
                report.skipped += 1;
                continue;
            }
            if let Err(source) = self.tracker.submit_work_log(work_log).await {
                warn!(issue_id = %work_log.issue_id, submitted = report.submitted, "work log submission failed");
                return Err(LinkError::Submit {
                    issue_id: work_log.issue_id.clone(),
                    submitted: report.submitted,
                    source,
                });
            }
            report.submitted += 1;
        }

        info!(
            submitted = report.submitted,
            skipped = report.skipped,
            unresolved = report.unresolved.len(),
            "work logs saved"
        );
        Ok(report)
    }
}
