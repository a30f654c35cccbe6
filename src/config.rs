// src/config.rs

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::{
    error::{EtlError, Result},
    report::DEFAULT_TOP_N,
    transform::DuplicateKeyPolicy,
};

pub const DEFAULT_SOURCE_URL: &str = "https://api.open.undp.org/api/sdg-index.json";

/// Everything a run needs. Stages receive the pieces they use explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub source_url: String,
    pub raw_json_path: PathBuf,
    pub country_reference_path: PathBuf,
    pub cleaned_output_path: PathBuf,
    pub top_n: usize,
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            raw_json_path: PathBuf::from("sdg_index_data.json"),
            country_reference_path: PathBuf::from("all_countries.csv"),
            cleaned_output_path: PathBuf::from("sdg_recipients_cleaned.csv"),
            top_n: DEFAULT_TOP_N,
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }
}

/// Command-line surface. Flags override the YAML file, which overrides the
/// built-in defaults.
#[derive(Debug, Default, Parser)]
#[command(name = "sdg-etl", about = "Fetch, clean and summarise SDG top-recipient data")]
pub struct Cli {
    /// YAML file with any of the configuration keys
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// URL of the SDG index JSON
    #[arg(long)]
    pub source_url: Option<String>,

    /// Where to save the raw JSON payload
    #[arg(long)]
    pub raw_json_path: Option<PathBuf>,

    /// Country reference CSV (country, iso3, capital, region, continents)
    #[arg(long)]
    pub country_reference_path: Option<PathBuf>,

    /// Where to save the cleaned table (.csv or .parquet)
    #[arg(long)]
    pub cleaned_output_path: Option<PathBuf>,

    /// How many countries to list in the budget summary
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Policy for iso3 keys repeated in the reference file
    #[arg(long, value_parser = parse_policy)]
    pub duplicate_keys: Option<DuplicateKeyPolicy>,
}

fn parse_policy(s: &str) -> std::result::Result<DuplicateKeyPolicy, String> {
    match s {
        "error" => Ok(DuplicateKeyPolicy::Error),
        "first-match" => Ok(DuplicateKeyPolicy::FirstMatch),
        "fan-out" => Ok(DuplicateKeyPolicy::FanOut),
        other => Err(format!(
            "unknown policy {:?} (expected error, first-match or fan-out)",
            other
        )),
    }
}

impl PipelineConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
        Self::from_yaml_str(&text)
            .map_err(|e| EtlError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Resolve defaults, the optional config file and flags, then validate.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Some(v) = &cli.source_url {
            cfg.source_url = v.clone();
        }
        if let Some(v) = &cli.raw_json_path {
            cfg.raw_json_path = v.clone();
        }
        if let Some(v) = &cli.country_reference_path {
            cfg.country_reference_path = v.clone();
        }
        if let Some(v) = &cli.cleaned_output_path {
            cfg.cleaned_output_path = v.clone();
        }
        if let Some(v) = cli.top_n {
            cfg.top_n = v;
        }
        if let Some(v) = cli.duplicate_keys {
            cfg.duplicate_keys = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.source_url)
            .map_err(|e| EtlError::Config(format!("source_url {:?}: {}", self.source_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EtlError::Config(format!(
                "source_url must be http(s), got {:?}",
                url.scheme()
            )));
        }

        for (name, path) in [
            ("raw_json_path", &self.raw_json_path),
            ("country_reference_path", &self.country_reference_path),
            ("cleaned_output_path", &self.cleaned_output_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(EtlError::Config(format!("{} is empty", name)));
            }
        }

        if self.top_n == 0 {
            return Err(EtlError::Config("top_n must be at least 1".into()));
        }
        Ok(())
    }
}
