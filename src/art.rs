use crate::state::PresentationState;
use anyhow::Result;
use image::imageops::FilterType;
use image::DynamicImage;
use reqwest::Client;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const ART_COLS: u32 = 40;
pub const ART_ROWS: u32 = 20;

const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArtCell {
    pub glyph: char,
    pub rgb: (u8, u8, u8),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsciiArt {
    pub rows: Vec<Vec<ArtCell>>,
}

/// Downscale `img` to `cols` x `rows` cells, one glyph per cell picked by
/// brightness and coloured with the cell's pixel.
pub fn render(img: &DynamicImage, cols: u32, rows: u32) -> AsciiArt {
    let small = img
        .resize_exact(cols.max(1), rows.max(1), FilterType::Triangle)
        .to_rgb8();

    let rows = (0..small.height())
        .map(|y| {
            (0..small.width())
                .map(|x| {
                    let [r, g, b] = small.get_pixel(x, y).0;
                    let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
                    let idx = (luma * (RAMP.len() - 1) as f32).round() as usize;
                    ArtCell {
                        glyph: RAMP[idx.min(RAMP.len() - 1)],
                        rgb: (r, g, b),
                    }
                })
                .collect()
        })
        .collect();

    AsciiArt { rows }
}

pub async fn fetch(client: &Client, url: &str) -> Result<AsciiArt> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let img = image::load_from_memory(&bytes)?;
    // terminal cells are about twice as tall as wide
    Ok(render(&img, ART_COLS, ART_ROWS))
}

/// Station logo, shaded top to bottom from orange to purple.
pub fn logo() -> AsciiArt {
    let lines = [
        "                                        ",
        "              ╲  │  ╱                   ",
        "            ───  ✱  ───                 ",
        "              ╱  │  ╲                   ",
        "                                        ",
        "        ██   ██  ██████                 ",
        "         ██ ██   ██   ██                ",
        "          ███    ██   ██                ",
        "         ██ ██   ██   ██                ",
        "        ██   ██  ██████                 ",
        "                                        ",
        "    ██▀█ ▄▀▀▄ █▀▀▄ █ ▄▀▀▄               ",
        "    █▀▀▄ █▀▀█ █  █ █ █  █               ",
        "    ▀  ▀ ▀  ▀ ▀▀▀  ▀  ▀▀                ",
        "                                        ",
    ];

    let start = (255.0, 140.0, 0.0);
    let end = (128.0, 0.0, 128.0);
    let n = (lines.len() - 1) as f32;

    let rows = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let t = i as f32 / n;
            let rgb = (
                (start.0 * (1.0 - t) + end.0 * t) as u8,
                (start.1 * (1.0 - t) + end.1 * t) as u8,
                (start.2 * (1.0 - t) + end.2 * t) as u8,
            );
            line.chars().map(|glyph| ArtCell { glyph, rgb }).collect()
        })
        .collect();

    AsciiArt { rows }
}

/// Follow the displayed cover and publish its rendering; `None` means "show
/// the logo".
pub async fn art_loop(
    client: Client,
    mut state: watch::Receiver<PresentationState>,
    art: watch::Sender<Option<AsciiArt>>,
    cancel: CancellationToken,
) {
    let mut current: Option<String> = None;

    loop {
        let wanted = state
            .borrow_and_update()
            .now_playing()
            .cover_url()
            .map(str::to_string);

        if wanted != current {
            let rendered = match &wanted {
                Some(url) => tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = fetch(&client, url) => match res {
                        Ok(a) => Some(a),
                        Err(e) => {
                            tracing::warn!("album art {} unavailable: {}", url, e);
                            None
                        }
                    },
                },
                None => None,
            };
            // a failed fetch is retried on the next state change
            current = if rendered.is_some() { wanted } else { None };
            let _ = art.send(rendered);
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
