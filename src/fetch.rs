// src/fetch.rs

use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

use crate::{
    dataset::RawDataset,
    error::{EtlError, Result},
};

/// GET `url`, parse the body as JSON and save the body byte-for-byte to
/// `raw_path` (parent directories are created). A body that does not parse
/// is not saved.
#[tracing::instrument(level = "info", skip(client, raw_path), fields(dest = %raw_path.as_ref().display()))]
pub async fn fetch_dataset(
    client: &Client,
    url: &str,
    raw_path: impl AsRef<Path>,
) -> Result<RawDataset> {
    let raw_path = raw_path.as_ref();
    let url = Url::parse(url).map_err(|e| EtlError::Config(format!("source url {url:?}: {e}")))?;

    let network = |source: reqwest::Error| EtlError::Network {
        url: url.to_string(),
        source,
    };
    let resp = client
        .get(url.as_str())
        .send()
        .await
        .map_err(network)?
        .error_for_status()
        .map_err(network)?;
    let bytes = resp.bytes().await.map_err(network)?;
    info!(bytes = bytes.len(), "downloaded");

    let dataset = RawDataset::from_slice(&bytes)?;

    if let Some(parent) = raw_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| EtlError::io(parent, e))?;
    }
    fs::write(raw_path, &bytes)
        .await
        .map_err(|e| EtlError::io(raw_path, e))?;
    info!("JSON file saved at {}", raw_path.display());

    Ok(dataset)
}
