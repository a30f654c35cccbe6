// src/dataset.rs

use serde_json::{Map, Value};

use crate::error::{EtlError, Result};

/// The fetched payload, kept as parsed JSON so it can be persisted and
/// compared without loss.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    value: Value,
}

/// One sustainable-development goal and the countries it funds most.
#[derive(Debug, Clone, PartialEq)]
pub struct SdgRecord {
    pub sdg_code: String,
    pub sdg_name: Option<String>,
    pub top_recipients: Vec<RecipientEntry>,
}

/// A single entry of `top_recipients`. Absent or null fields stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientEntry {
    pub name: Option<String>,
    pub iso3: Option<String>,
    pub total_budget: Option<f64>,
    pub total_expense: Option<f64>,
}

impl RawDataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            value: serde_json::from_slice(bytes)?,
        })
    }

    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Interpret the payload as SDG records.
    ///
    /// The payload is normally an array of records; a lone object is read as
    /// a one-record dataset. Anything else, or a record missing one of
    /// `sdg_code`, `sdg_name`, `top_recipients`, is a structural error.
    pub fn records(&self) -> Result<Vec<SdgRecord>> {
        match &self.value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_record(item, &format!("[{}]", i)))
                .collect(),
            Value::Object(_) => Ok(vec![parse_record(&self.value, "$")?]),
            other => Err(EtlError::structural(format!(
                "expected an array of SDG records, found {}",
                kind(other)
            ))),
        }
    }
}

fn parse_record(item: &Value, path: &str) -> Result<SdgRecord> {
    let obj = as_object(item, path)?;

    let sdg_code = required(obj, "sdg_code", path)
        .and_then(|v| text(v, &format!("{}.sdg_code", path)))?
        .ok_or_else(|| EtlError::structural(format!("{}.sdg_code is null", path)))?;
    let sdg_name = required(obj, "sdg_name", path)
        .and_then(|v| text(v, &format!("{}.sdg_name", path)))?;

    let recipients_path = format!("{}.top_recipients", path);
    let top_recipients = match required(obj, "top_recipients", path)? {
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(j, e)| parse_recipient(e, &format!("{}[{}]", recipients_path, j)))
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(EtlError::structural(format!(
                "{} must be an array, found {}",
                recipients_path,
                kind(other)
            )))
        }
    };

    Ok(SdgRecord {
        sdg_code,
        sdg_name,
        top_recipients,
    })
}

fn parse_recipient(item: &Value, path: &str) -> Result<RecipientEntry> {
    let obj = as_object(item, path)?;
    let field = |key: &str| (obj.get(key), format!("{}.{}", path, key));

    let (v, p) = field("name");
    let name = v.map(|v| text(v, &p)).transpose()?.flatten();
    let (v, p) = field("iso3");
    let iso3 = v
        .map(|v| text(v, &p))
        .transpose()?
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let (v, p) = field("total_budget");
    let total_budget = v.map(|v| number(v, &p)).transpose()?.flatten();
    let (v, p) = field("total_expense");
    let total_expense = v.map(|v| number(v, &p)).transpose()?.flatten();

    Ok(RecipientEntry {
        name,
        iso3,
        total_budget,
        total_expense,
    })
}

fn as_object<'a>(item: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    item.as_object().ok_or_else(|| {
        EtlError::structural(format!("{} must be an object, found {}", path, kind(item)))
    })
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| EtlError::structural(format!("{} has no field `{}`", path, key)))
}

/// Strings pass through, numbers are rendered (`1` → "1"), null is `None`.
fn text(v: &Value, path: &str) -> Result<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(EtlError::structural(format!(
            "{} must be a string, found {}",
            path,
            kind(other)
        ))),
    }
}

/// Numbers pass through; numeric strings are parsed, blank strings are null.
/// Non-finite values ("NaN", "inf") are rejected.
fn number(v: &Value, path: &str) -> Result<Option<f64>> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| EtlError::structural(format!("{} is not a number: {:?}", path, s))),
        other => Err(EtlError::structural(format!(
            "{} must be numeric, found {}",
            path,
            kind(other)
        ))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
