//! Raw retail line records and their loader.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::DataError;

/// One invoice line. Field aliases accept the column names of the usual
/// online-retail exports (`Invoice`, `StockCode`, `Customer ID`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    #[serde(alias = "Invoice", deserialize_with = "string_or_number")]
    pub invoice: String,
    #[serde(alias = "StockCode", deserialize_with = "string_or_number")]
    pub stock_code: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    /// Negative for returns.
    #[serde(alias = "Quantity")]
    pub quantity: i64,
    #[serde(alias = "Price")]
    pub price: Decimal,
    #[serde(default, alias = "Customer ID", deserialize_with = "optional_string_or_number")]
    pub customer_id: Option<String>,
    #[serde(default, alias = "Country")]
    pub country: Option<String>,
}

/// Load records from a JSON array or from JSON Lines (one record per line).
pub fn load_records(path: &Path) -> Result<Vec<LineRecord>, DataError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| DataError::ReadFile { path: path.to_path_buf(), source })?;
    parse_records(&raw).map_err(|source| DataError::ParseFile { path: path.to_path_buf(), source })
}

pub fn parse_records(raw: &str) -> Result<Vec<LineRecord>, serde_json::Error> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw);
    }

    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<LineRecord>)
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(number) => Ok(number_to_code(&number)),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value)),
        Value::Number(number) => Ok(Some(number_to_code(&number))),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

/// Spreadsheet exports store integer codes as floats (`12583.0`).
fn number_to_code(number: &serde_json::Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{value:.0}"),
        _ => number.to_string(),
    }
}
