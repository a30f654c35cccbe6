// src/reference.rs

use csv::{ReaderBuilder, Trim};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, info, warn};

use crate::error::{EtlError, Result};

/// Columns the reference file must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = ["country", "iso3", "capital", "region", "continents"];

/// One row of the country lookup. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRow {
    pub country: Option<String>,
    pub iso3: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub continents: Option<String>,
}

/// The country lookup indexed by `iso3`, file order kept within each key.
#[derive(Debug, Default)]
pub struct CountryReference {
    by_iso3: HashMap<String, Vec<CountryRow>>,
    rows: usize,
}

impl CountryReference {
    #[tracing::instrument(level = "info", skip(path), fields(file = %path.as_ref().display()))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        let reference = Self::from_reader(BufReader::new(file), path)?;
        info!(
            rows = reference.len(),
            keys = reference.by_iso3.len(),
            "loaded country reference"
        );
        Ok(reference)
    }

    /// Parse a comma-separated reference with a header row. `source` only
    /// labels errors.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| csv_error(source, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut idx = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, col) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers.iter().position(|h| h == col).ok_or_else(|| {
                EtlError::structural(format!(
                    "{} is missing required column `{}` (found: {})",
                    source.display(),
                    col,
                    headers.join(", ")
                ))
            })?;
        }
        let [country_i, iso3_i, capital_i, region_i, continents_i] = idx;

        let mut reference = CountryReference::default();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(source, e))?;
            let cell = |i: usize| {
                record
                    .get(i)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            let Some(iso3) = cell(iso3_i) else {
                debug!(line = line + 2, "skipping reference row without iso3");
                continue;
            };
            let row = CountryRow {
                country: cell(country_i),
                iso3: iso3.clone(),
                capital: cell(capital_i),
                region: cell(region_i),
                continents: cell(continents_i),
            };
            reference.by_iso3.entry(iso3).or_default().push(row);
            reference.rows += 1;
        }

        let mut duplicates: Vec<(&String, usize)> = reference
            .by_iso3
            .iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(iso3, rows)| (iso3, rows.len()))
            .collect();
        duplicates.sort();
        for (iso3, count) in duplicates {
            warn!(iso3 = %iso3, count, "duplicate iso3 in country reference");
        }

        Ok(reference)
    }

    /// All reference rows for `iso3`, in file order. Empty when unknown.
    pub fn lookup(&self, iso3: &str) -> &[CountryRow] {
        self.by_iso3.get(iso3).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

fn csv_error(source: &Path, e: csv::Error) -> EtlError {
    let msg = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(err) => EtlError::io(source, err),
        _ => EtlError::structural(format!("{}: {}", source.display(), msg)),
    }
}
