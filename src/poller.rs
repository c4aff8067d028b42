use crate::error::Result;
use crate::icecast;
use crate::music::MusicClient;
use crate::state::{PresentationState, TrackInfo};
use crate::token::TokenRefresher;
use reqwest::Client;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Result of one poll cycle. Failures never reach the screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    NoData,
    SoftFailure(String),
}

/// Fetch the current track, refreshing the token and retrying exactly once
/// when the music service rejects it.
pub async fn fetch_track(
    music: &MusicClient,
    refresher: &TokenRefresher,
) -> Result<Option<TrackInfo>> {
    match music.current_track().await {
        Err(e) if e.is_unauthorized() => {
            tracing::info!("music-service token expired, refreshing");
            refresher.refresh(music).await?;
            music.current_track().await
        }
        other => other,
    }
}

pub async fn poll_track(
    music: &MusicClient,
    refresher: &TokenRefresher,
    state: &watch::Sender<PresentationState>,
    cancel: &CancellationToken,
) -> PollOutcome {
    let result = fetch_track(music, refresher).await;
    if cancel.is_cancelled() {
        return PollOutcome::NoData;
    }

    match result {
        Ok(Some(track)) => {
            tracing::debug!(artist = %track.artist, title = %track.title, "track updated");
            state.send_modify(|s| {
                s.track = track;
                s.track_updated_at = Some(Instant::now());
            });
            PollOutcome::Updated
        }
        Ok(None) => PollOutcome::NoData,
        Err(e) => {
            tracing::warn!("track poll failed: {}", e);
            PollOutcome::SoftFailure(e.to_string())
        }
    }
}

pub async fn poll_listeners(
    http: &Client,
    status_url: &str,
    state: &watch::Sender<PresentationState>,
    cancel: &CancellationToken,
) -> PollOutcome {
    let result = icecast::fetch_source_stats(http, status_url).await;
    if cancel.is_cancelled() {
        return PollOutcome::NoData;
    }

    match result {
        Ok(Some(stats)) => {
            tracing::debug!(
                listeners = stats.listeners,
                peak = stats.listener_peak,
                "listener stats updated"
            );
            state.send_modify(|s| {
                s.stream.apply(stats);
                s.stream_updated_at = Some(Instant::now());
            });
            PollOutcome::Updated
        }
        Ok(None) => PollOutcome::NoData,
        Err(e) => {
            tracing::warn!("listener poll failed: {}", e);
            PollOutcome::SoftFailure(e.to_string())
        }
    }
}
