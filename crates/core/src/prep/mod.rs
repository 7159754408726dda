//! Preparation of raw retail line records into a basket matrix.
//!
//! Load, clean (drop incomplete, cancelled and non-positive lines, cap
//! outliers), then pivot into a [`TransactionMatrix`](crate::matrix::TransactionMatrix).

mod basket;
mod catalog;
mod clean;
mod outliers;
mod records;

pub use basket::{build_matrix, BasketOptions, ItemKey};
pub use catalog::ItemCatalog;
pub use clean::{retail_data_prep, CleaningOptions, CleaningReport};
pub use outliers::{
    quantile, replace_with_thresholds, CappingOptions, NumericColumn, OutlierBounds,
};
pub use records::{load_records, parse_records, LineRecord};
