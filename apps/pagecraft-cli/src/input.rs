//! Reading inputs from disk or over HTTP

use std::path::Path;

use anyhow::{Context, Result};
use pagecraft_core::PageCraftError;
use tracing::{debug, info};

/// A loaded input and the name it is reported under.
pub struct Input {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Display name for `source`: the last path or URL segment.
pub fn display_name(source: &str) -> String {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    trimmed
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(source)
        .to_string()
}

pub async fn read_input(source: &str) -> Result<Input> {
    let bytes = if is_url(source) {
        fetch(source).await?
    } else {
        tokio::fs::read(Path::new(source))
            .await
            .with_context(|| format!("Failed to read {}", source))?
    };
    debug!(source, size_bytes = bytes.len(), "input loaded");
    Ok(Input {
        name: display_name(source),
        bytes,
    })
}

/// Fetch once; a non-success status is reported, never retried.
async fn fetch(url: &str) -> Result<Vec<u8>> {
    info!(url, "fetching input");
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    let status = response.status();
    if !status.is_success() {
        let error = PageCraftError::NetworkError {
            status: status.as_u16(),
        };
        return Err(anyhow::Error::new(error).context(format!("Fetching {}", url)));
    }

    let body = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    Ok(body.to_vec())
}
