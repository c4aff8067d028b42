use crate::error::{Error, Result};
use crate::music::MusicClient;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Exchanges the backend's stored credential for a fresh music-service token.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    http: Client,
    url: String,
}

impl TokenRefresher {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Fetch a token and install it into `music`. Never retries.
    pub async fn refresh(&self, music: &MusicClient) -> Result<()> {
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Status(resp.status().as_u16()));
        }

        let TokenResponse { token } = resp.json().await?;
        if token.is_empty() {
            return Err(Error::MalformedToken);
        }

        tracing::debug!("music-service token refreshed");
        music.set_token(token);
        Ok(())
    }
}
