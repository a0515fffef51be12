//! Photo loading for the rasterizer.
//!
//! `imageSrc` may be a `data:` URI, an http(s) URL or a local path.

use std::time::Duration;

use base64::Engine;
use image::DynamicImage;

use crate::error::{Error, Result};

/// Load the photo referenced by an `imageSrc` value.
pub fn load_photo(source: &str, fetch_timeout: Duration) -> Result<DynamicImage> {
    let source = source.trim();
    let bytes = if source.starts_with("data:") {
        decode_data_uri(source)?
    } else if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source, fetch_timeout)?
    } else if source.is_empty() {
        return Err(Error::Export("no photo selected".to_string()));
    } else {
        std::fs::read(source)?
    };

    Ok(image::load_from_memory(&bytes)?)
}

/// Decode the payload of a base64 `data:` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| Error::Export("invalid data URI format".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(Error::Export(
            "only base64 data URIs are supported".to_string(),
        ));
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Export(format!("failed to decode base64 photo: {}", e)))
}

/// Fetch a remote photo on a private current-thread runtime.
fn fetch_remote(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Http(format!("failed to build tokio runtime: {e}")))?;
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

    runtime.block_on(async {
        let resp = http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("photo request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http(format!(
                "photo request returned {}",
                status.as_u16()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("photo read body failed: {e}")))?;
        tracing::debug!(url, bytes = bytes.len(), "Fetched remote photo");
        Ok(bytes.to_vec())
    })
}
