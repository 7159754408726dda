//! Interquartile-range outlier capping.
//!
//! The "quartiles" are taken at wide percentiles (1st/99th by default) so only
//! extreme values are clipped. Quantiles interpolate linearly between order
//! statistics.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::records::LineRecord;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CappingOptions {
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    pub iqr_multiplier: f64,
}

impl Default for CappingOptions {
    fn default() -> Self {
        Self { lower_quantile: 0.01, upper_quantile: 0.99, iqr_multiplier: 1.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericColumn {
    Quantity,
    Price,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlierBounds {
    pub low: f64,
    pub up: f64,
}

impl OutlierBounds {
    /// `None` when `values` is empty.
    pub fn from_values(values: &[f64], options: &CappingOptions) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, options.lower_quantile)?;
        let q3 = quantile(&sorted, options.upper_quantile)?;
        let range = q3 - q1;
        let margin = options.iqr_multiplier * range;
        Some(Self { low: q1 - margin, up: q3 + margin })
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.low, self.up)
    }
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Clip one numeric column of `records` in place. Returns how many values
/// changed.
pub fn replace_with_thresholds(
    records: &mut [LineRecord],
    column: NumericColumn,
    options: &CappingOptions,
) -> usize {
    let values: Vec<f64> = records.iter().filter_map(|record| read(record, column)).collect();
    let Some(bounds) = OutlierBounds::from_values(&values, options) else {
        return 0;
    };

    let mut capped = 0;
    for record in records.iter_mut() {
        if write_clipped(record, column, &bounds) {
            capped += 1;
        }
    }
    capped
}

fn read(record: &LineRecord, column: NumericColumn) -> Option<f64> {
    match column {
        NumericColumn::Quantity => Some(record.quantity as f64),
        NumericColumn::Price => record.price.to_f64(),
    }
}

fn write_clipped(record: &mut LineRecord, column: NumericColumn, bounds: &OutlierBounds) -> bool {
    match column {
        // Integer quantities round toward the inside of the bounds.
        NumericColumn::Quantity => {
            let value = record.quantity as f64;
            let clipped = if value > bounds.up {
                bounds.up.floor()
            } else if value < bounds.low {
                bounds.low.ceil()
            } else {
                return false;
            };
            record.quantity = clipped as i64;
            true
        }
        NumericColumn::Price => {
            let Some(value) = record.price.to_f64() else {
                return false;
            };
            if (bounds.low..=bounds.up).contains(&value) {
                return false;
            }
            match Decimal::from_f64(bounds.clip(value)) {
                Some(clipped) => {
                    record.price = clipped;
                    true
                }
                None => false,
            }
        }
    }
}
