use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use sdg_etl::{config::Cli, pipeline, PipelineConfig};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout is reserved for the summaries
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) resolve configuration ───────────────────────────────────
    let cli = Cli::parse();
    let cfg = PipelineConfig::from_cli(&cli).context("loading configuration")?;
    info!(
        source = %cfg.source_url,
        raw = %cfg.raw_json_path.display(),
        reference = %cfg.country_reference_path.display(),
        output = %cfg.cleaned_output_path.display(),
        "configured"
    );

    // ─── 3) run extract → transform → load ──────────────────────────
    let client = Client::builder()
        .build()
        .context("building HTTP client")?;
    let start = Instant::now();
    let report = pipeline::run(&client, &cfg)
        .await
        .with_context(|| format!("pipeline run for {}", cfg.source_url))?;
    info!(rows = report.stats.output, elapsed = ?start.elapsed(), "all done");

    // ─── 4) summaries ───────────────────────────────────────────────
    print!("{}", report.summary);
    Ok(())
}
