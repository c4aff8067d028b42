//! Terminal client for xD Radio: plays the stream and shows listener counts
//! and what is playing, polled from the stream server and the music service.

pub mod art;
pub mod config;
pub mod error;
pub mod icecast;
pub mod logging;
pub mod music;
pub mod player;
pub mod poller;
pub mod presenter;
pub mod state;
pub mod token;
pub mod ui;

pub use config::Config;
pub use error::{Error, Result};
pub use presenter::{PlaybackReporter, PollSources, Presenter};
pub use state::{NowPlaying, PlaybackEvent, PlaybackStatus, PresentationState, StreamMeta, TrackInfo};
