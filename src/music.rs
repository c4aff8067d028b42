//! Music-service "currently playing" client

use crate::error::{Error, Result};
use crate::state::TrackInfo;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::RwLock;

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: Option<String>,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl Item {
    fn into_track_info(self) -> Result<TrackInfo> {
        let title = self.name.ok_or(Error::MalformedTrack("item has no name"))?;
        let artist = self
            .artists
            .into_iter()
            .next()
            .ok_or(Error::MalformedTrack("item has no artist"))?
            .name;
        let album_cover_url = self
            .album
            .and_then(|a| a.images.into_iter().next())
            .map(|i| i.url)
            .unwrap_or_default();

        Ok(TrackInfo {
            artist,
            title,
            album_cover_url,
        })
    }
}

/// Client for the music service. Holds the bearer token; the token is only
/// replaced through [`MusicClient::set_token`].
#[derive(Debug)]
pub struct MusicClient {
    http: Client,
    url: String,
    token: RwLock<Option<String>>,
}

impl MusicClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            token: RwLock::new(None),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_token(&self, token: String) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token);
        }
    }

    /// Ask for the track currently playing.
    ///
    /// `Ok(None)` when nothing is playing (204, empty body, `null` or no
    /// `item`). A 401 maps to [`Error::Unauthorized`].
    pub async fn current_track(&self) -> Result<Option<TrackInfo>> {
        let mut req = self.http.get(&self.url);
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        match resp.status() {
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(Error::Unauthorized),
            s if !s.is_success() => return Err(Error::Status(s.as_u16())),
            _ => {}
        }

        let body = resp.bytes().await?;
        parse_currently_playing(&body)
    }
}

fn parse_currently_playing(body: &[u8]) -> Result<Option<TrackInfo>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let payload: Option<CurrentlyPlaying> = serde_json::from_slice(body)?;
    match payload.and_then(|p| p.item) {
        Some(item) => item.into_track_info().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload() {
        let body = br#"{
            "is_playing": true,
            "item": {
                "name": "B",
                "artists": [{"name": "A"}, {"name": "Other"}],
                "album": {"images": [{"url": "U"}, {"url": "small"}]}
            }
        }"#;
        let track = parse_currently_playing(body).unwrap().unwrap();
        assert_eq!(track.artist, "A");
        assert_eq!(track.title, "B");
        assert_eq!(track.album_cover_url, "U");
    }

    #[test]
    fn nothing_playing_shapes() {
        assert!(parse_currently_playing(b"").unwrap().is_none());
        assert!(parse_currently_playing(b"  \n").unwrap().is_none());
        assert!(parse_currently_playing(b"null").unwrap().is_none());
        assert!(parse_currently_playing(br#"{"item": null}"#).unwrap().is_none());
        assert!(parse_currently_playing(br#"{"is_playing": false}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_artist_fails_soft() {
        let body = br#"{"item": {"name": "B", "artists": [], "album": {"images": []}}}"#;
        assert!(matches!(
            parse_currently_playing(body),
            Err(Error::MalformedTrack(_))
        ));
    }

    #[test]
    fn missing_cover_is_empty() {
        let body = br#"{"item": {"name": "B", "artists": [{"name": "A"}], "album": {"images": []}}}"#;
        let track = parse_currently_playing(body).unwrap().unwrap();
        assert_eq!(track.album_cover_url, "");

        let body = br#"{"item": {"name": "B", "artists": [{"name": "A"}]}}"#;
        let track = parse_currently_playing(body).unwrap().unwrap();
        assert_eq!(track.album_cover_url, "");
    }

    #[test]
    fn token_is_replaced() {
        let client = MusicClient::new(Client::new(), "http://localhost/now");
        assert_eq!(client.token(), None);
        client.set_token("t1".into());
        client.set_token("t2".into());
        assert_eq!(client.token().as_deref(), Some("t2"));
    }
}
