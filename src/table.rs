// src/table.rs

use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Output columns, in file order.
pub const COLUMNS: [&str; 9] = [
    "iso3",
    "recipient_budget",
    "recipient_expense",
    "sdg_code",
    "sdg_name",
    "country",
    "capital",
    "region",
    "continents",
];

/// One (SDG, recipient) pair that survived the completeness gate.
///
/// `capital`, `region` and `continents` are not optional: a row without
/// them cannot be constructed by the transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientRow {
    pub iso3: String,
    pub recipient_budget: Option<f64>,
    pub recipient_expense: Option<f64>,
    pub sdg_code: String,
    pub sdg_name: Option<String>,
    pub country: Option<String>,
    pub capital: String,
    pub region: String,
    pub continents: String,
}

/// The cleaned table handed to the loader and reporter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientTable {
    rows: Vec<RecipientRow>,
}

impl RecipientTable {
    pub fn new(rows: Vec<RecipientRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[RecipientRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Arrow schema of the output, one field per entry of [`COLUMNS`].
    pub fn schema() -> Arc<Schema> {
        let nullable = |name: &str| {
            matches!(
                name,
                "recipient_budget" | "recipient_expense" | "sdg_name" | "country"
            )
        };
        let fields: Vec<Field> = COLUMNS
            .iter()
            .map(|&name| {
                let dt = match name {
                    "recipient_budget" | "recipient_expense" => DataType::Float64,
                    _ => DataType::Utf8,
                };
                Field::new(name, dt, nullable(name))
            })
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Build a single record batch holding every row.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let rows = &self.rows;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.iso3))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.recipient_budget))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.recipient_expense))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.sdg_code))),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.sdg_name.as_deref()))),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.country.as_deref()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.capital))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.region))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.continents))),
        ];

        RecordBatch::try_new(Self::schema(), columns)
    }
}
