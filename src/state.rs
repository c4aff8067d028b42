use std::time::Instant;

/// Whether the audio stream can currently be heard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    NeverStarted,
    Playing,
    Stalled,
}

/// Signals emitted by the audio player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// First audio decoded, the stream can play.
    Ready,
    /// Decoder output ended.
    Stalled,
}

impl PlaybackStatus {
    pub fn on_event(self, event: PlaybackEvent) -> Self {
        match (self, event) {
            (_, PlaybackEvent::Ready) => PlaybackStatus::Playing,
            (PlaybackStatus::Playing, PlaybackEvent::Stalled) => PlaybackStatus::Stalled,
            (other, PlaybackEvent::Stalled) => other,
        }
    }

    pub fn is_online(self) -> bool {
        self == PlaybackStatus::Playing
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub artist: String,
    pub title: String,
    pub album_cover_url: String,
}

/// Listener counts and the title embedded in the stream by the broadcaster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamMeta {
    pub icecast_title: String,
    pub listeners: u32,
    pub max_listeners: u32,
}

/// One source entry reported by the stream server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub listeners: u32,
    pub listener_peak: u32,
    pub title: Option<String>,
}

impl StreamMeta {
    /// Counts are always overwritten. The title only changes when the source
    /// sends a non-empty one, so a title that disappears upstream stays shown.
    pub fn apply(&mut self, stats: SourceStats) {
        self.listeners = stats.listeners;
        self.max_listeners = stats.listener_peak;
        if let Some(title) = stats.title.filter(|t| !t.is_empty()) {
            self.icecast_title = title;
        }
    }
}

/// What the "now playing" area shows. Derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NowPlaying {
    Nothing,
    StreamTitle(String),
    Track {
        title: String,
        artist: String,
        cover_url: String,
    },
}

impl NowPlaying {
    pub fn cover_url(&self) -> Option<&str> {
        match self {
            NowPlaying::Track { cover_url, .. } if !cover_url.is_empty() => Some(cover_url),
            _ => None,
        }
    }
}

/// Everything the UI reads. Each poller owns its own fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresentationState {
    pub playback: PlaybackStatus,
    pub track: TrackInfo,
    pub stream: StreamMeta,
    pub track_updated_at: Option<Instant>,
    pub stream_updated_at: Option<Instant>,
}

impl PresentationState {
    pub fn is_online(&self) -> bool {
        self.playback.is_online()
    }

    pub fn now_playing(&self) -> NowPlaying {
        if !self.stream.icecast_title.is_empty() {
            NowPlaying::StreamTitle(self.stream.icecast_title.clone())
        } else if !self.track.title.is_empty() {
            NowPlaying::Track {
                title: self.track.title.clone(),
                artist: self.track.artist.clone(),
                cover_url: self.track.album_cover_url.clone(),
            }
        } else {
            NowPlaying::Nothing
        }
    }

    /// Most recent successful update of either poller.
    pub fn last_updated(&self) -> Option<Instant> {
        self.track_updated_at.max(self.stream_updated_at)
    }
}
