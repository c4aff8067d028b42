use crate::art::{self, AsciiArt};
use crate::player::PlayerControl;
use crate::state::{NowPlaying, PlaybackStatus, PresentationState};
use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Terminal,
};
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::watch;

struct UIState {
    last_volume_change: Instant,
    saved_volume: Option<f32>,
}

pub async fn run_ui(
    state: watch::Receiver<PresentationState>,
    cover_art: watch::Receiver<Option<AsciiArt>>,
    control: Option<PlayerControl>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state, cover_art, control.as_ref()).await;

    if let Some(c) = &control {
        c.stop();
    }
    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: watch::Receiver<PresentationState>,
    cover_art: watch::Receiver<Option<AsciiArt>>,
    control: Option<&PlayerControl>,
) -> Result<()> {
    let logo = art::logo();
    let mut ui_state = UIState {
        last_volume_change: Instant::now()
            .checked_sub(Duration::from_secs(60))
            .unwrap_or_else(Instant::now),
        saved_volume: None,
    };

    loop {
        let snapshot = state.borrow().clone();
        let cover = cover_art.borrow().clone();

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
                .split(f.size());

            let left = Paragraph::new(art_lines(cover.as_ref().unwrap_or(&logo))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Magenta)),
            );
            f.render_widget(left, chunks[0]);

            let lines = info_lines(&snapshot, control, &ui_state);
            let right = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" ✱ xD Radio ✱ ")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
            f.render_widget(right, chunks[1]);
        })?;

        if let Some(Event::Key(key)) = next_event(Duration::from_millis(200)).await? {
            if key.code == KeyCode::Char('q') {
                return Ok(());
            }
            if let Some(c) = control {
                handle_key(key.code, c, &mut ui_state);
            }
        }
    }
}

/// Wait up to `timeout` for a terminal event without holding a runtime worker.
async fn next_event(timeout: Duration) -> Result<Option<Event>> {
    let event = tokio::task::spawn_blocking(move || -> std::io::Result<Option<Event>> {
        if event::poll(timeout)? {
            event::read().map(Some)
        } else {
            Ok(None)
        }
    })
    .await??;
    Ok(event)
}

fn handle_key(code: KeyCode, control: &PlayerControl, ui_state: &mut UIState) {
    let step = match code {
        KeyCode::Char(' ') => {
            control.toggle_pause();
            return;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => 0.1,
        KeyCode::Char('-') => -0.1,
        KeyCode::Up => 0.05,
        KeyCode::Down => -0.05,
        KeyCode::Char('m') => {
            let current = control.volume();
            if current > 0.0 {
                ui_state.saved_volume = Some(current);
                control.set_volume(0.0);
            } else {
                control.set_volume(ui_state.saved_volume.unwrap_or(0.5));
            }
            ui_state.last_volume_change = Instant::now();
            return;
        }
        _ => return,
    };
    control.set_volume(control.volume() + step);
    ui_state.last_volume_change = Instant::now();
}

fn art_lines(art: &AsciiArt) -> Vec<Line<'static>> {
    art.rows
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|cell| {
                        let (r, g, b) = cell.rgb;
                        Span::styled(cell.glyph.to_string(), Style::default().fg(Color::Rgb(r, g, b)))
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn label(text: &'static str, color: Color) -> Span<'static> {
    Span::styled(text, Style::default().fg(color))
}

fn bold(text: String) -> Span<'static> {
    Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
}

fn online_span(status: PlaybackStatus) -> Span<'static> {
    let (text, color) = match status {
        PlaybackStatus::Playing => ("ONLINE", Color::Green),
        PlaybackStatus::Stalled => ("OFFLINE (stream lost)", Color::Red),
        PlaybackStatus::NeverStarted => ("OFFLINE", Color::Red),
    };
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn now_playing_lines(np: &NowPlaying) -> Vec<Line<'static>> {
    match np {
        NowPlaying::Nothing => vec![],
        NowPlaying::StreamTitle(title) => vec![Line::from(vec![
            label("Title:  ", Color::Cyan),
            bold(title.clone()),
        ])],
        NowPlaying::Track { title, artist, .. } => vec![
            Line::from(vec![label("Title:  ", Color::Cyan), bold(title.clone())]),
            Line::from(vec![label("Artist: ", Color::Cyan), bold(artist.clone())]),
        ],
    }
}

fn info_lines(
    state: &PresentationState,
    control: Option<&PlayerControl>,
    ui_state: &UIState,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![label("Status: ", Color::Gray), online_span(state.playback)]),
        Line::from(vec![
            label("Listeners: ", Color::Gray),
            bold(format!(
                "{} / {}",
                state.stream.listeners, state.stream.max_listeners
            )),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "♫ Now playing ♫",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(now_playing_lines(&state.now_playing()));
    if let Some(at) = state.last_updated() {
        lines.push(Line::from(Span::styled(
            format!("updated {}", format_age(at.elapsed())),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        )));
    }
    lines.push(Line::from(""));

    match control {
        Some(c) => {
            let paused = c.is_paused();
            let volume = c.volume();
            lines.push(Line::from(vec![
                label("Player: ", Color::Gray),
                if paused {
                    Span::styled("⏸ Paused", Style::default().fg(Color::Yellow))
                } else {
                    Span::styled("▶ Playing", Style::default().fg(Color::Green))
                },
            ]));
            lines.push(Line::from(vec![
                if ui_state.last_volume_change.elapsed() < Duration::from_secs(2) {
                    Span::styled("🔊 ", Style::default().fg(Color::Yellow))
                } else {
                    Span::raw("")
                },
                label("Volume: ", Color::Magenta),
                bold(format!("{:.0}%", volume * 100.0)),
            ]));
            lines.push(Line::from(volume_bar(volume)));
        }
        None => lines.push(Line::from(Span::styled(
            "Audio unavailable (is ffmpeg installed?)",
            Style::default().fg(Color::Yellow),
        ))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "─── Controls ───",
        Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
    )));
    for (key, help) in [
        ("  Space", " : pause/resume"),
        ("    +/-", " : volume up/down"),
        ("    ↑/↓", " : fine volume"),
        ("      m", " : mute/unmute"),
        ("      q", " : quit"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(
                key,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(help),
        ]));
    }
    lines
}

fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=4 => "just now".to_string(),
        5..=59 => format!("{}s ago", secs),
        _ => format!("{}m ago", secs / 60),
    }
}

fn volume_bar(volume: f32) -> String {
    let vol_percent = (volume * 100.0).round() as usize;
    let bar_length = 20;
    let filled = (vol_percent * bar_length / 100).min(bar_length);

    let mut bar = String::from("│");
    for i in 0..bar_length {
        bar.push(if i >= filled {
            '·'
        } else if i < bar_length * 60 / 100 {
            '▓'
        } else if i < bar_length * 80 / 100 {
            '▒'
        } else {
            '░'
        });
    }
    bar.push('│');

    bar.push_str(match vol_percent {
        0 => " 🔇",
        1..=29 => " 🔈",
        30..=69 => " 🔉",
        _ => " 🔊",
    });
    bar
}
