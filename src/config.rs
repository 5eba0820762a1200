//! Configuration loader and validator for the board/tracker bridge.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub server: Server,
    pub trello: Trello,
    pub youtrack: YouTrack,
    #[serde(default)]
    pub http: Http,
}

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub listen: String,
    pub static_dir: String,
}

/// Trello credentials and the board/list whose time is reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trello {
    pub api_key: String,
    pub api_token: String,
    pub board_id: String,
    pub doing_list_name: String,
}

/// YouTrack instance and permanent token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YouTrack {
    pub base_url: String,
    pub token: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Outbound HTTP settings shared by both clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Http {
    pub timeout_seconds: u64,
}

impl Default for Http {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .parse()
            .map_err(|_| ConfigError::Invalid("server.listen must be a socket address"))
    }

    pub fn youtrack_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.youtrack.base_url)
            .map_err(|_| ConfigError::Invalid("youtrack.base_url must be a valid URL"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.listen_addr()?;
    if cfg.server.static_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("server.static_dir must be non-empty"));
    }

    let t = &cfg.trello;
    if t.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("trello.api_key must be non-empty"));
    }
    if t.api_token.trim().is_empty() {
        return Err(ConfigError::Invalid("trello.api_token must be non-empty"));
    }
    if t.board_id.trim().is_empty() {
        return Err(ConfigError::Invalid("trello.board_id must be non-empty"));
    }
    if t.doing_list_name.trim().is_empty() {
        return Err(ConfigError::Invalid("trello.doing_list_name must be non-empty"));
    }

    if cfg.youtrack.token.trim().is_empty() {
        return Err(ConfigError::Invalid("youtrack.token must be non-empty"));
    }
    cfg.youtrack_url()?;

    if cfg.http.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("http.timeout_seconds must be > 0"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the project.
pub fn example() -> &'static str {
    r#"server:
  listen: "127.0.0.1:8787"
  static_dir: "./static"

trello:
  api_key: "YOUR_TRELLO_API_KEY"
  api_token: "YOUR_TRELLO_API_TOKEN"
  board_id: "TRELLO_BOARD_ID"
  doing_list_name: "Doing"

youtrack:
  base_url: "https://youtrack.example.com"
  token: "YOUR_YOUTRACK_PERMANENT_TOKEN"
  accept_invalid_certs: false

http:
  timeout_seconds: 30
"#
}
