//! Now-playing presenter: owns the presentation state and the two pollers.

use crate::config::Config;
use crate::music::MusicClient;
use crate::poller::{self, PollOutcome};
use crate::state::{PlaybackEvent, PresentationState};
use crate::token::TokenRefresher;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Everything the pollers talk to.
#[derive(Debug, Clone)]
pub struct PollSources {
    pub http: Client,
    pub status_url: String,
    pub music: Arc<MusicClient>,
    pub refresher: TokenRefresher,
}

impl PollSources {
    pub fn from_config(config: &Config, http: Client) -> Self {
        Self {
            status_url: config.status_url.clone(),
            music: Arc::new(MusicClient::new(http.clone(), &config.now_playing_url)),
            refresher: TokenRefresher::new(http.clone(), &config.token_url),
            http,
        }
    }
}

/// Reports player readiness into the presentation state.
#[derive(Debug, Clone)]
pub struct PlaybackReporter {
    state: Arc<watch::Sender<PresentationState>>,
    cancel: CancellationToken,
}

impl PlaybackReporter {
    pub fn report(&self, event: PlaybackEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::info!(?event, "playback event");
        self.state
            .send_modify(|s| s.playback = s.playback.on_event(event));
    }
}

pub struct Presenter {
    state: Arc<watch::Sender<PresentationState>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Presenter {
    /// Start both pollers. Each runs once right away, then every `period`,
    /// whether or not the stream is online.
    pub fn start(sources: PollSources, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(PresentationState::default());
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        {
            let PollSources {
                http, status_url, ..
            } = sources.clone();
            let state = state.clone();
            let c = cancel.clone();
            spawn_loop(&tracker, cancel.clone(), period, move || {
                let http = http.clone();
                let url = status_url.clone();
                let state = state.clone();
                let c = c.clone();
                async move { poller::poll_listeners(&http, &url, &state, &c).await }
            });
        }

        {
            let PollSources {
                music, refresher, ..
            } = sources;
            let state = state.clone();
            let c = cancel.clone();
            spawn_loop(&tracker, cancel.clone(), period, move || {
                let music = music.clone();
                let refresher = refresher.clone();
                let state = state.clone();
                let c = c.clone();
                async move { poller::poll_track(&music, &refresher, &state, &c).await }
            });
        }

        Self {
            state,
            cancel,
            tracker,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PresentationState {
        self.state.borrow().clone()
    }

    pub fn playback_reporter(&self) -> PlaybackReporter {
        PlaybackReporter {
            state: self.state.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Token that is cancelled when the presenter shuts down.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the timers, drop in-flight cycles and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::debug!("presenter stopped");
    }
}

/// Tick immediately and then every `period`. Each cycle gets its own task so a
/// slow one may overlap the next; every cycle overwrites the same fields.
fn spawn_loop<F, Fut>(tracker: &TaskTracker, cancel: CancellationToken, period: Duration, mut cycle: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = PollOutcome> + Send + 'static,
{
    let cycles = tracker.clone();
    tracker.spawn(async move {
        let mut ticker = interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let fut = cycle();
                    let cancel = cancel.clone();
                    cycles.spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = fut => {}
                        }
                    });
                }
            }
        }
    });
}
