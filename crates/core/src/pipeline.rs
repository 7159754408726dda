//! Single entry point from a transaction matrix to a rule table.

use tracing::info_span;

use crate::errors::MiningError;
use crate::matrix::TransactionMatrix;
use crate::mining::{FrequentItemsetTable, ItemsetMiner};
use crate::rules::{RuleGenerator, RuleMetric, RuleTable};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MiningParams {
    /// Minimum fraction of transactions an itemset must appear in.
    pub min_support: f64,
    /// Metric the rule threshold applies to.
    pub metric: RuleMetric,
    pub min_threshold: f64,
    /// Largest itemset size to mine; unbounded when `None`.
    pub max_len: Option<usize>,
    pub parallel: bool,
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            metric: RuleMetric::Support,
            min_threshold: 0.01,
            max_len: None,
            parallel: true,
        }
    }
}

/// Everything one run produces. The itemset table is only kept for reporting;
/// recommendations need the rules alone.
#[derive(Clone, Debug)]
pub struct MiningRun {
    pub itemsets: FrequentItemsetTable,
    pub rules: RuleTable,
}

pub fn run(matrix: &TransactionMatrix, params: &MiningParams) -> Result<MiningRun, MiningError> {
    let span = info_span!(
        "mine_rules",
        transactions = matrix.transaction_count(),
        items = matrix.item_count(),
        min_support = params.min_support,
        metric = params.metric.as_str(),
        min_threshold = params.min_threshold,
    );
    let _entered = span.enter();

    // Fail on a bad rule threshold before paying for the mining pass.
    params.metric.validate_threshold(params.min_threshold)?;

    let itemsets = ItemsetMiner::new()
        .with_parallel(params.parallel)
        .with_max_len(params.max_len)
        .mine(matrix, params.min_support)?;
    let rules = RuleGenerator::new().with_parallel(params.parallel).generate(
        &itemsets,
        params.min_threshold,
        params.metric,
    )?;

    Ok(MiningRun { itemsets, rules })
}

pub fn mine_rules(
    matrix: &TransactionMatrix,
    params: &MiningParams,
) -> Result<RuleTable, MiningError> {
    run(matrix, params).map(|run| run.rules)
}
