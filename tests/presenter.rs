//! Presenter lifecycle against mock endpoints

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xd_radio::{
    Config, NowPlaying, PlaybackEvent, PlaybackStatus, PollSources, PresentationState, Presenter,
};

const NOW_PLAYING: &str = "/v1/me/player/currently-playing";
const TOKEN: &str = "/api/token";
const STATUS: &str = "/status-json.xsl";
const HOUR: Duration = Duration::from_secs(3600);

fn sources(server: &MockServer) -> PollSources {
    let config = Config {
        status_url: format!("{}{}", server.uri(), STATUS),
        token_url: format!("{}{}", server.uri(), TOKEN),
        now_playing_url: format!("{}{}", server.uri(), NOW_PLAYING),
        ..Config::default()
    };
    PollSources::from_config(&config, Client::new())
}

fn track_json(artist: &str, title: &str, cover: &str) -> serde_json::Value {
    json!({
        "item": {
            "name": title,
            "artists": [{"name": artist}],
            "album": {"images": [{"url": cover}]}
        }
    })
}

async fn mount_status(server: &MockServer, source: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"icestats": {"source": source}})))
        .mount(server)
        .await;
}

async fn mount_track(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn both_polled(rx: &mut watch::Receiver<PresentationState>) -> PresentationState {
    timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.track_updated_at.is_some() && s.stream_updated_at.is_some()),
    )
    .await
    .expect("pollers did not run")
    .expect("presenter dropped")
    .clone()
}

#[tokio::test]
async fn first_cycle_runs_immediately_and_shows_track() {
    let server = MockServer::start().await;
    mount_status(&server, json!({"listeners": 12, "listener_peak": 50, "title": ""})).await;
    mount_track(&server, track_json("A", "B", "U")).await;

    let presenter = Presenter::start(sources(&server), HOUR);
    let state = both_polled(&mut presenter.subscribe()).await;

    assert_eq!(state.stream.listeners, 12);
    assert_eq!(state.stream.max_listeners, 50);
    assert_eq!(
        state.now_playing(),
        NowPlaying::Track {
            title: "B".into(),
            artist: "A".into(),
            cover_url: "U".into(),
        }
    );
    assert!(!state.is_online());

    presenter.shutdown().await;
}

#[tokio::test]
async fn stream_title_overrides_track() {
    let server = MockServer::start().await;
    mount_status(&server, json!({"listeners": 3, "listener_peak": 4, "title": "Live Set"})).await;
    mount_track(&server, track_json("A", "B", "U")).await;

    let presenter = Presenter::start(sources(&server), HOUR);
    let state = both_polled(&mut presenter.subscribe()).await;

    assert_eq!(state.now_playing(), NowPlaying::StreamTitle("Live Set".into()));
    assert_eq!(state.now_playing().cover_url(), None);
    assert_eq!(state.track.title, "B");

    presenter.shutdown().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_within_a_cycle() {
    let server = MockServer::start().await;
    mount_status(&server, json!({"listeners": 1, "listener_peak": 1})).await;

    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json("Retry", "Fresh", "new.jpg")))
        .mount(&server)
        .await;

    let presenter = Presenter::start(sources(&server), HOUR);
    let state = both_polled(&mut presenter.subscribe()).await;

    assert_eq!(state.track.artist, "Retry");
    assert_eq!(state.track.title, "Fresh");
    assert_eq!(state.track.album_cover_url, "new.jpg");

    presenter.shutdown().await;
    server.verify().await;
}

#[tokio::test]
async fn failing_endpoints_leave_initial_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let presenter = Presenter::start(sources(&server), HOUR);
    sleep(Duration::from_millis(300)).await;

    assert_eq!(presenter.snapshot(), PresentationState::default());
    assert!(!server.received_requests().await.unwrap_or_default().is_empty());

    presenter.shutdown().await;
}

#[tokio::test]
async fn polls_repeat_every_period() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"icestats": {}})))
        .expect(3..)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .respond_with(ResponseTemplate::new(204))
        .expect(3..)
        .mount(&server)
        .await;

    let presenter = Presenter::start(sources(&server), Duration::from_millis(100));
    sleep(Duration::from_millis(450)).await;
    presenter.shutdown().await;

    server.verify().await;
}

#[tokio::test]
async fn overlapping_cycles_keep_state_consistent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"icestats": {"source": {"listeners": 5, "listener_peak": 9}}}))
                .set_delay(Duration::from_millis(120)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json("A", "B", "U"))
                .set_delay(Duration::from_millis(120)),
        )
        .mount(&server)
        .await;

    let presenter = Presenter::start(sources(&server), Duration::from_millis(30));
    presenter.playback_reporter().report(PlaybackEvent::Ready);
    sleep(Duration::from_millis(500)).await;

    let state = presenter.snapshot();
    assert_eq!(state.stream.listeners, 5);
    assert_eq!(state.stream.max_listeners, 9);
    assert_eq!(state.track.title, "B");
    assert_eq!(state.playback, PlaybackStatus::Playing);

    presenter.shutdown().await;
}

#[tokio::test]
async fn no_updates_after_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"icestats": {"source": {"listeners": 5, "listener_peak": 9}}}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(NOW_PLAYING))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json("A", "B", "U"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let presenter = Presenter::start(sources(&server), HOUR);
    let rx = presenter.subscribe();
    let reporter = presenter.playback_reporter();
    sleep(Duration::from_millis(50)).await;

    presenter.shutdown().await;
    reporter.report(PlaybackEvent::Ready);
    sleep(Duration::from_millis(500)).await;

    assert_eq!(*rx.borrow(), PresentationState::default());
}
