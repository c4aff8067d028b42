use crate::error::{Error, Result};
use crate::state::SourceStats;
use reqwest::Client;
use serde_json::Value;

/// Fetch the stream server's status document and pick its source entry.
///
/// `Ok(None)` means the server answered but reports no source.
pub async fn fetch_source_stats(client: &Client, url: &str) -> Result<Option<SourceStats>> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(Error::Status(resp.status().as_u16()));
    }
    let json = resp.json::<Value>().await?;
    Ok(parse_status(&json))
}

/// Icecast reports `source` as an object for one mount and as an array for
/// several; only the first mount counts.
pub fn parse_status(v: &Value) -> Option<SourceStats> {
    let source = v.get("icestats")?.get("source")?;
    let s = if source.is_array() {
        source.get(0)?
    } else {
        source
    };
    if !s.is_object() {
        return None;
    }

    let count = |key: &str| {
        s.get(key)
            .and_then(|x| x.as_u64())
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    };

    let title = s
        .get("title")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string());

    Some(SourceStats {
        listeners: count("listeners"),
        listener_peak: count("listener_peak"),
        title,
    })
}
