use crate::presenter::PlaybackReporter;
use crate::state::PlaybackEvent;
use anyhow::{anyhow, Result};
use rodio::{OutputStream, Sink, Source};
use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

const CHANNELS: u16 = 2;
const SAMPLE_RATE: u32 = 44100;

pub struct PlayerControl {
    child: Arc<Mutex<Option<Child>>>,
    sink: Arc<Mutex<Sink>>,
    _stream: OutputStream, // must keep alive or audio stops
}

impl PlayerControl {
    pub fn stop(&self) {
        if let Ok(s) = self.sink.lock() {
            s.stop();
        }

        if let Ok(mut guard) = self.child.lock() {
            if let Some(mut c) = guard.take() {
                let _ = c.kill();
                let _ = c.wait();
            }
        }
    }

    pub fn toggle_pause(&self) {
        if let Ok(s) = self.sink.lock() {
            if s.is_paused() {
                s.play();
            } else {
                s.pause();
            }
        }
    }

    pub fn set_volume(&self, vol: f32) {
        if let Ok(s) = self.sink.lock() {
            s.set_volume(vol.clamp(0.0, 2.0));
        }
    }

    pub fn is_paused(&self) -> bool {
        self.sink.lock().map(|s| s.is_paused()).unwrap_or(true)
    }

    pub fn volume(&self) -> f32 {
        self.sink.lock().map(|s| s.volume()).unwrap_or(0.0)
    }
}

impl Drop for PlayerControl {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode `stream_url` with ffmpeg into a rodio sink. The first decoded chunk
/// reports [`PlaybackEvent::Ready`]; the end of ffmpeg's output reports
/// [`PlaybackEvent::Stalled`].
pub fn spawn_ffmpeg_to_rodio(stream_url: &str, reporter: PlaybackReporter) -> Result<PlayerControl> {
    let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
        anyhow!(
            "Failed to initialize audio output: {}. Check your audio drivers.",
            e
        )
    })?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| anyhow!("Failed to create audio sink: {}", e))?;
    sink.set_volume(0.5);

    let mut child = Command::new("ffmpeg")
        .args(["-reconnect", "1", "-reconnect_streamed", "1", "-reconnect_delay_max", "5"])
        .arg("-i")
        .arg(stream_url)
        .args(["-f", "s16le", "-acodec", "pcm_s16le"])
        .arg("-ar")
        .arg(SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg(CHANNELS.to_string())
        .args(["-hide_banner", "-loglevel", "error", "-"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("Failed to spawn ffmpeg: {}. Is ffmpeg installed?", e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Failed to capture ffmpeg stdout"))?;

    let (tx, rx) = mpsc::sync_channel::<Vec<i16>>(10);

    thread::spawn(move || {
        pump(BufReader::new(stdout), tx, |event| reporter.report(event));
    });

    sink.append(PcmSource::new(rx, CHANNELS, SAMPLE_RATE));
    tracing::info!("playing {}", stream_url);

    Ok(PlayerControl {
        child: Arc::new(Mutex::new(Some(child))),
        sink: Arc::new(Mutex::new(sink)),
        _stream: stream,
    })
}

/// Read s16le PCM from `reader` into `tx`. Reports `Ready` once, on the
/// first bytes, and `Stalled` when the reader ends or fails. Returns quietly
/// when the receiving side is gone.
fn pump<R: Read>(mut reader: R, tx: mpsc::SyncSender<Vec<i16>>, report: impl Fn(PlaybackEvent)) {
    let mut buf = [0u8; 8192];
    let mut carry = None;
    let mut ready = false;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if !ready {
                    ready = true;
                    report(PlaybackEvent::Ready);
                }
                if tx.send(decode_le(&mut carry, &buf[..n])).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("ffmpeg read failed: {}", e);
                break;
            }
        }
    }
    tracing::info!("stream decoder output ended");
    report(PlaybackEvent::Stalled);
}

/// Pipe reads may split a sample; an odd trailing byte is kept in `carry`
/// and completed by the next read.
fn decode_le(carry: &mut Option<u8>, bytes: &[u8]) -> Vec<i16> {
    let mut samples = Vec::with_capacity(bytes.len() / 2 + 1);
    let mut rest = bytes;

    if let Some(lo) = carry.take() {
        match rest.split_first() {
            Some((&hi, tail)) => {
                samples.push(i16::from_le_bytes([lo, hi]));
                rest = tail;
            }
            None => {
                *carry = Some(lo);
                return samples;
            }
        }
    }

    let mut chunks = rest.chunks_exact(2);
    samples.extend(chunks.by_ref().map(|b| i16::from_le_bytes([b[0], b[1]])));
    *carry = chunks.remainder().first().copied();
    samples
}

/// Raw s16le PCM chunks from ffmpeg as a rodio source. Plays silence while
/// the decoder is buffering.
struct PcmSource {
    rx: mpsc::Receiver<Vec<i16>>,
    buffer: VecDeque<i16>,
    channels: u16,
    sample_rate: u32,
}

impl PcmSource {
    fn new(rx: mpsc::Receiver<Vec<i16>>, channels: u16, sample_rate: u32) -> Self {
        PcmSource {
            rx,
            buffer: VecDeque::with_capacity(8192),
            channels,
            sample_rate,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(s) = self.buffer.pop_front() {
            return Some(s as f32 / 32768.0);
        }

        match self.rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                self.buffer.extend(chunk);
                Some(self.buffer.pop_front().map_or(0.0, |s| s as f32 / 32768.0))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Some(0.0),
            Err(mpsc::RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Source for PcmSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }
    fn channels(&self) -> u16 {
        self.channels
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn total_duration(&self) -> Option<Duration> {
        None // live stream
    }
}
