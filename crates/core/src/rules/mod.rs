//! Association rule generation.

mod generator;
mod metrics;
mod table;

pub use generator::RuleGenerator;
pub use metrics::{RuleMetric, RuleMetrics};
pub use table::{Rule, RuleTable};

use crate::errors::MiningError;
use crate::mining::FrequentItemsetTable;

/// Derive every rule whose `metric` reaches `min_threshold`.
pub fn generate(
    frequent_itemsets: &FrequentItemsetTable,
    min_threshold: f64,
    metric: RuleMetric,
) -> Result<RuleTable, MiningError> {
    RuleGenerator::new().generate(frequent_itemsets, min_threshold, metric)
}
