// src/transform.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    dataset::{RawDataset, SdgRecord},
    error::{EtlError, Result},
    reference::{CountryReference, CountryRow},
    table::{RecipientRow, RecipientTable},
};

/// What to do when a recipient's `iso3` matches several reference rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    /// Fail with [`EtlError::JoinAmbiguity`].
    #[default]
    Error,
    /// Use the first matching row in file order.
    FirstMatch,
    /// Emit one output row per matching reference row.
    FanOut,
}

/// A recipient row straight out of the nested payload, before the join.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecipient {
    pub sdg_code: String,
    pub sdg_name: Option<String>,
    pub country_name: Option<String>,
    pub iso3: Option<String>,
    pub recipient_budget: Option<f64>,
    pub recipient_expense: Option<f64>,
}

/// Row counts observed while transforming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub records: usize,
    pub flattened: usize,
    pub unmatched: usize,
    pub incomplete: usize,
    pub output: usize,
}

/// One row per (SDG, recipient) pair; an empty `top_recipients` contributes
/// nothing.
pub fn flatten(records: &[SdgRecord]) -> Vec<FlatRecipient> {
    records
        .iter()
        .flat_map(|record| {
            record.top_recipients.iter().map(move |r| FlatRecipient {
                sdg_code: record.sdg_code.clone(),
                sdg_name: record.sdg_name.clone(),
                country_name: r.name.clone(),
                iso3: r.iso3.clone(),
                recipient_budget: r.total_budget,
                recipient_expense: r.total_expense,
            })
        })
        .collect()
}

/// Left join on `iso3`. Each flattened row yields its matching reference
/// rows (per `policy`), or a single `None` when nothing matches.
pub fn join<'a>(
    flat: &'a [FlatRecipient],
    reference: &'a CountryReference,
    policy: DuplicateKeyPolicy,
) -> Result<Vec<(&'a FlatRecipient, Option<&'a CountryRow>)>> {
    let mut joined = Vec::with_capacity(flat.len());
    for row in flat {
        let matches = row
            .iso3
            .as_deref()
            .map(|iso3| reference.lookup(iso3))
            .unwrap_or(&[]);

        match (matches, policy) {
            ([], _) => joined.push((row, None)),
            ([only], _) => joined.push((row, Some(only))),
            (many, DuplicateKeyPolicy::Error) => {
                return Err(EtlError::JoinAmbiguity {
                    iso3: row.iso3.clone().unwrap_or_default(),
                    count: many.len(),
                })
            }
            ([first, ..], DuplicateKeyPolicy::FirstMatch) => joined.push((row, Some(first))),
            (many, DuplicateKeyPolicy::FanOut) => {
                joined.extend(many.iter().map(|m| (row, Some(m))))
            }
        }
    }
    Ok(joined)
}

/// Completeness gate plus name reconciliation: keep the pair only when the
/// reference supplies `capital`, `region` and `continents`. The reference
/// country name always replaces the recipient-supplied one, even when blank.
pub fn complete_row(flat: &FlatRecipient, country: Option<&CountryRow>) -> Option<RecipientRow> {
    let country = country?;
    Some(RecipientRow {
        iso3: country.iso3.clone(),
        recipient_budget: flat.recipient_budget,
        recipient_expense: flat.recipient_expense,
        sdg_code: flat.sdg_code.clone(),
        sdg_name: flat.sdg_name.clone(),
        country: country.country.clone(),
        capital: country.capital.clone()?,
        region: country.region.clone()?,
        continents: country.continents.clone()?,
    })
}

/// Flatten, join, filter and reconcile `dataset` against `reference`.
#[tracing::instrument(level = "info", skip_all)]
pub fn transform(
    dataset: &RawDataset,
    reference: &CountryReference,
    policy: DuplicateKeyPolicy,
) -> Result<(RecipientTable, TransformStats)> {
    let records = dataset.records()?;
    let flat = flatten(&records);
    let joined = join(&flat, reference, policy)?;

    let mut stats = TransformStats {
        records: records.len(),
        flattened: flat.len(),
        ..Default::default()
    };

    let mut rows = Vec::with_capacity(joined.len());
    for (recipient, country) in joined {
        match complete_row(recipient, country) {
            Some(row) => rows.push(row),
            None if country.is_none() => {
                debug!(iso3 = ?recipient.iso3, sdg = %recipient.sdg_code, "no reference row");
                stats.unmatched += 1;
            }
            None => {
                debug!(iso3 = ?recipient.iso3, sdg = %recipient.sdg_code, "incomplete reference row");
                stats.incomplete += 1;
            }
        }
    }
    stats.output = rows.len();

    info!(
        records = stats.records,
        flattened = stats.flattened,
        unmatched = stats.unmatched,
        incomplete = stats.incomplete,
        output = stats.output,
        "data transformation complete"
    );
    Ok((RecipientTable::new(rows), stats))
}
