//! Rule derivation from a frequent itemset table.
//!
//! Every frequent itemset `F` with at least two members is split into each
//! non-empty proper subset `A` and its complement `C = F \ A`. Subsets are
//! enumerated as bitmasks over `F`'s canonical members, `1..2^|F| - 1`, so
//! neither side is ever empty.

use rayon::prelude::*;
use tracing::info;

use super::metrics::{RuleMetric, RuleMetrics};
use super::table::{Rule, RuleTable};
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::mining::{FrequentItemset, FrequentItemsetTable};

/// Itemsets wider than this cannot be split with a `u64` mask.
const MAX_SPLIT_WIDTH: usize = 63;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuleGenerator {
    parallel: bool,
}

impl RuleGenerator {
    pub fn new() -> Self {
        Self { parallel: false }
    }

    /// Derive per-itemset rules on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn generate(
        &self,
        table: &FrequentItemsetTable,
        min_threshold: f64,
        metric: RuleMetric,
    ) -> Result<RuleTable, MiningError> {
        metric.validate_threshold(min_threshold)?;

        let sources: Vec<&FrequentItemset> =
            table.iter().filter(|entry| entry.itemset.len() >= 2).collect();

        let per_itemset: Vec<Vec<Rule>> = if self.parallel {
            sources
                .par_iter()
                .map(|entry| rules_for(table, entry, min_threshold, metric))
                .collect::<Result<_, _>>()?
        } else {
            sources
                .iter()
                .map(|entry| rules_for(table, entry, min_threshold, metric))
                .collect::<Result<_, _>>()?
        };

        let rules: Vec<Rule> = per_itemset.into_iter().flatten().collect();
        info!(
            source_itemsets = sources.len(),
            rules = rules.len(),
            metric = metric.as_str(),
            min_threshold,
            "association rules generated"
        );
        Ok(RuleTable::new(rules))
    }
}

fn rules_for(
    table: &FrequentItemsetTable,
    entry: &FrequentItemset,
    min_threshold: f64,
    metric: RuleMetric,
) -> Result<Vec<Rule>, MiningError> {
    let width = entry.itemset.len();
    if width > MAX_SPLIT_WIDTH {
        return Err(MiningError::InvalidParameter(format!(
            "itemset of {width} members is too wide to split into rules; lower max_len"
        )));
    }

    let full: u64 = (1 << width) - 1;
    let mut rules = Vec::new();
    for mask in 1..full {
        let antecedent = entry.itemset.select(mask);
        let consequent = entry.itemset.select(full ^ mask);
        let metrics = RuleMetrics::compute(
            subset_support(table, &antecedent)?,
            subset_support(table, &consequent)?,
            entry.support,
        );

        if metrics.value(metric) >= min_threshold {
            rules.push(Rule::new(antecedent, consequent, metrics)?);
        }
    }
    Ok(rules)
}

fn subset_support(table: &FrequentItemsetTable, subset: &Itemset) -> Result<f64, MiningError> {
    table
        .support(subset)
        .ok_or_else(|| MiningError::MissingSubsetSupport { itemset: subset.to_string() })
}

#[cfg(test)]
mod tests {
    use super::RuleGenerator;
    use crate::domain::item::ItemId;
    use crate::domain::itemset::Itemset;
    use crate::errors::{ErrorKind, MiningError};
    use crate::matrix::TransactionMatrix;
    use crate::mining::{FrequentItemset, FrequentItemsetTable, ItemsetMiner};
    use crate::rules::metrics::RuleMetric;

    fn ids(items: &[&str]) -> Vec<ItemId> {
        items.iter().map(|item| ItemId::from(*item)).collect()
    }

    fn set(items: &[&str]) -> Itemset {
        ids(items).into_iter().collect()
    }

    fn scenario_table(min_support: f64) -> FrequentItemsetTable {
        let matrix = TransactionMatrix::from_transactions(vec![
            ("T1", ids(&["A", "B"])),
            ("T2", ids(&["A", "B", "C"])),
            ("T3", ids(&["A"])),
            ("T4", ids(&["B", "C"])),
        ]);
        ItemsetMiner::new().mine(&matrix, min_support).expect("mining succeeds")
    }

    #[test]
    fn a_implies_b_metrics_match_scenario() {
        let rules = RuleGenerator::new()
            .generate(&scenario_table(0.5), 0.0, RuleMetric::Support)
            .expect("rules generate");

        let rule = rules
            .iter()
            .find(|rule| rule.antecedent() == &set(&["A"]) && rule.consequent() == &set(&["B"]))
            .expect("A -> B should be present");
        let metrics = rule.metrics();
        assert!((metrics.support - 0.5).abs() < 1e-9);
        assert!((metrics.confidence - 0.6667).abs() < 1e-3);
        assert!((metrics.lift - 0.8889).abs() < 1e-3);
    }

    #[test]
    fn every_split_of_each_itemset_is_emitted_once() {
        let rules = RuleGenerator::new()
            .generate(&scenario_table(0.25), 0.0, RuleMetric::Support)
            .expect("rules generate");

        // Three pairs give 2 rules each; {A, B, C} gives 2^3 - 2 = 6.
        assert_eq!(rules.len(), 12);
        for rule in &rules {
            assert!(!rule.antecedent().is_empty());
            assert!(!rule.consequent().is_empty());
            assert!(rule.antecedent().is_disjoint(rule.consequent()));
        }
    }

    #[test]
    fn threshold_filters_on_selected_metric() {
        let table = scenario_table(0.25);
        let by_confidence = RuleGenerator::new()
            .generate(&table, 1.0, RuleMetric::Confidence)
            .expect("rules generate");

        // Only C -> B ({B,C}: .5 / {C}: .5) and {A,C} -> B hold with certainty.
        let described: Vec<String> = by_confidence
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(described, vec!["{C} -> {B}", "{A, C} -> {B}"]);
        assert!(by_confidence.iter().all(|rule| rule.metrics().conviction.is_infinite()));
    }

    #[test]
    fn generation_order_follows_table_then_mask() {
        let rules = RuleGenerator::new()
            .generate(&scenario_table(0.5), 0.0, RuleMetric::Support)
            .expect("rules generate");

        let described: Vec<String> = rules
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(described, vec!["{A} -> {B}", "{B} -> {A}", "{B} -> {C}", "{C} -> {B}"]);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let result = RuleGenerator::new().generate(&scenario_table(0.5), 1.5, RuleMetric::Support);
        assert!(matches!(result, Err(MiningError::InvalidParameter(_))));
    }

    #[test]
    fn missing_subset_support_is_an_invariant_violation() {
        let mut table = FrequentItemsetTable::new(4, 0.5);
        table.push_level(vec![FrequentItemset { itemset: set(&["A"]), count: 3, support: 0.75 }]);
        table.push_level(vec![FrequentItemset {
            itemset: set(&["A", "B"]),
            count: 2,
            support: 0.5,
        }]);

        let error = RuleGenerator::new()
            .generate(&table, 0.0, RuleMetric::Support)
            .expect_err("missing {B} should fail");
        assert!(matches!(
            error,
            MiningError::MissingSubsetSupport { ref itemset } if itemset == "{B}"
        ));
        assert_eq!(error.kind(), ErrorKind::InternalInvariantViolation);
    }

    #[test]
    fn parallel_generation_matches_sequential() {
        let table = scenario_table(0.25);
        let sequential =
            RuleGenerator::new().generate(&table, 0.0, RuleMetric::Lift).expect("sequential");
        let parallel = RuleGenerator::new()
            .with_parallel(true)
            .generate(&table, 0.0, RuleMetric::Lift)
            .expect("parallel");

        assert_eq!(sequential, parallel);
    }
}
