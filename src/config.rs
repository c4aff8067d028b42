use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STREAM_URL: &str = "https://radio.segouin.me/stream";
pub const DEFAULT_STATUS_URL: &str = "https://radio.segouin.me/status-json.xsl";
pub const DEFAULT_TOKEN_URL: &str = "https://radio.segouin.me/api/token";
pub const DEFAULT_NOW_PLAYING_URL: &str =
    "https://api.spotify.com/v1/me/player/currently-playing";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stream_url: String,
    pub status_url: String,
    pub token_url: String,
    pub now_playing_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            status_url: DEFAULT_STATUS_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            now_playing_url: DEFAULT_NOW_PLAYING_URL.to_string(),
            poll_interval_secs: 30,
            request_timeout_secs: 30,
            user_agent: concat!("xd_radio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// `<config_dir>/xd_radio/config.json`
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("xd_radio").join("config.json"))
    }

    /// Defaults, then the config file if there is one, then `XD_RADIO_*`
    /// environment variables.
    pub fn load() -> Result<Self> {
        let mut config = match Self::path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_json(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("XD_RADIO_STREAM_URL") {
            self.stream_url = v;
        }
        if let Some(v) = lookup("XD_RADIO_STATUS_URL") {
            self.status_url = v;
        }
        if let Some(v) = lookup("XD_RADIO_TOKEN_URL") {
            self.token_url = v;
        }
        if let Some(v) = lookup("XD_RADIO_NOW_PLAYING_URL") {
            self.now_playing_url = v;
        }
        if let Some(v) = lookup("XD_RADIO_POLL_INTERVAL") {
            self.poll_interval_secs = v
                .parse()
                .with_context(|| format!("XD_RADIO_POLL_INTERVAL={v:?} is not a number"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
