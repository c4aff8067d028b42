use anyhow::Result;
use reqwest::Client;
use tokio::sync::watch;
use xd_radio::{art, logging, player, ui, Config, PollSources, Presenter};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init()?;
    let config = Config::load()?;
    tracing::info!(?config, "starting");

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .build()?;

    let presenter = Presenter::start(
        PollSources::from_config(&config, client.clone()),
        config.poll_interval(),
    );

    let (art_tx, art_rx) = watch::channel(None);
    let art_task = tokio::spawn(art::art_loop(
        client,
        presenter.subscribe(),
        art_tx,
        presenter.cancellation(),
    ));

    println!("🔗 Connecting to: {}", config.stream_url);
    let control = match player::spawn_ffmpeg_to_rodio(&config.stream_url, presenter.playback_reporter()) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::error!("audio disabled: {:#}", e);
            None
        }
    };

    let ui_result = ui::run_ui(presenter.subscribe(), art_rx, control).await;

    presenter.shutdown().await;
    let _ = art_task.await;

    match ui_result {
        Ok(()) => println!("Thanks for listening to xD Radio!"),
        Err(e) => {
            eprintln!("UI error: {:?}", e);
            if let Some(path) = log_path {
                eprintln!("See {} for details", path.display());
            }
        }
    }

    Ok(())
}
