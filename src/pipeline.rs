// src/pipeline.rs

use reqwest::Client;
use tracing::info;

use crate::{
    config::PipelineConfig,
    dataset::RawDataset,
    error::Result,
    fetch::fetch_dataset,
    load::write_table,
    reference::CountryReference,
    report::{summarize, Summary},
    table::RecipientTable,
    transform::{transform, TransformStats},
};

/// What a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub stats: TransformStats,
    pub summary: Summary,
}

/// Fetch → transform → load → summarise. The first error aborts the run.
pub async fn run(client: &Client, cfg: &PipelineConfig) -> Result<RunReport> {
    info!(url = %cfg.source_url, "extract");
    let raw = fetch_dataset(client, &cfg.source_url, &cfg.raw_json_path).await?;
    process(&raw, cfg)
}

/// The synchronous tail of a run, for a payload already in hand.
pub fn process(raw: &RawDataset, cfg: &PipelineConfig) -> Result<RunReport> {
    let (table, stats) = clean(raw, cfg)?;
    write_table(&table, &cfg.cleaned_output_path)?;
    let summary = summarize(&table, cfg.top_n);
    Ok(RunReport { stats, summary })
}

/// Load the country reference and transform `raw` against it.
pub fn clean(raw: &RawDataset, cfg: &PipelineConfig) -> Result<(RecipientTable, TransformStats)> {
    let reference = CountryReference::from_path(&cfg.country_reference_path)?;
    transform(raw, &reference, cfg.duplicate_keys)
}
