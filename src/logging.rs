use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `<cache_dir>/xd_radio/xd_radio.log`
pub fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("xd_radio").join("xd_radio.log"))
}

/// Log to a file: the terminal is owned by the UI. `RUST_LOG` overrides the
/// default `xd_radio=info` filter. Without a cache directory nothing is logged.
pub fn init() -> Result<Option<PathBuf>> {
    let Some(path) = log_path() else {
        return Ok(None);
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xd_radio=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))?;

    Ok(Some(path))
}
