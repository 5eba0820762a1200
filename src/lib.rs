//! Links Trello cards to YouTrack issues and logs the time spent on them.

pub mod config;
pub mod extractor;
pub mod linking;
pub mod model;
pub mod trello;
pub mod web;
pub mod youtrack;

pub use extractor::{IssueIdExtractor, IssueUrlExtractor};
pub use linking::{BoardSource, IssueTracker, LinkError, LinkingEngine, SaveReport};
