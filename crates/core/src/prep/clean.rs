//! Retail line cleaning ahead of basket construction.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::outliers::{replace_with_thresholds, CappingOptions, NumericColumn};
use super::records::LineRecord;

#[derive(Clone, Debug, PartialEq)]
pub struct CleaningOptions {
    /// Invoices whose id contains this marker are cancellations.
    pub cancellation_marker: String,
    pub capping: CappingOptions,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self { cancellation_marker: "C".to_owned(), capping: CappingOptions::default() }
    }
}

/// What cleaning removed or changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input: usize,
    pub missing_fields: usize,
    pub cancelled: usize,
    pub non_positive: usize,
    pub kept: usize,
    pub quantity_capped: usize,
    pub price_capped: usize,
}

impl CleaningReport {
    pub fn dropped(&self) -> usize {
        self.input - self.kept
    }
}

/// Drop incomplete lines (any of invoice, stock code, description, customer or
/// country missing), cancellations and non-positive quantity/price lines,
/// then cap quantity and price outliers.
pub fn retail_data_prep(
    records: Vec<LineRecord>,
    options: &CleaningOptions,
) -> (Vec<LineRecord>, CleaningReport) {
    let mut report = CleaningReport { input: records.len(), ..CleaningReport::default() };

    let mut kept: Vec<LineRecord> = Vec::with_capacity(records.len());
    for record in records {
        if is_incomplete(&record) {
            report.missing_fields += 1;
        } else if is_cancellation(&record, &options.cancellation_marker) {
            report.cancelled += 1;
        } else if record.quantity <= 0 || record.price <= Decimal::ZERO {
            report.non_positive += 1;
        } else {
            kept.push(record);
        }
    }

    report.quantity_capped =
        replace_with_thresholds(&mut kept, NumericColumn::Quantity, &options.capping);
    report.price_capped =
        replace_with_thresholds(&mut kept, NumericColumn::Price, &options.capping);
    report.kept = kept.len();

    if kept.is_empty() && report.input > 0 {
        warn!(input = report.input, "cleaning dropped every line record");
    } else {
        info!(
            input = report.input,
            kept = report.kept,
            cancelled = report.cancelled,
            quantity_capped = report.quantity_capped,
            price_capped = report.price_capped,
            "line records cleaned"
        );
    }
    (kept, report)
}

fn is_incomplete(record: &LineRecord) -> bool {
    let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
    record.invoice.trim().is_empty()
        || record.stock_code.trim().is_empty()
        || blank(&record.description)
        || blank(&record.customer_id)
        || blank(&record.country)
}

fn is_cancellation(record: &LineRecord, marker: &str) -> bool {
    !marker.is_empty() && record.invoice.contains(marker)
}
