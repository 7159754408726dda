//! Rule-based recommendations.
//!
//! Rules are ranked by lift (stable, so ties keep rule-table order) and every
//! rule whose antecedent contains the target item contributes its consequent.
//! Asking for more than exist is not an error, and neither is a target that
//! never appears in an antecedent.

use tracing::debug;

use crate::domain::item::ItemId;
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::rules::{Rule, RuleTable};

/// Up to `count` consequent itemsets recommended for `target`, best lift first.
pub fn recommend(
    rules: &RuleTable,
    target: &ItemId,
    count: usize,
) -> Result<Vec<Itemset>, MiningError> {
    Ok(recommend_rules(rules, target, count)?
        .into_iter()
        .map(|rule| rule.consequent().clone())
        .collect())
}

/// Same selection as [`recommend`], returning the matching rules so callers can
/// show their metrics.
pub fn recommend_rules<'a>(
    rules: &'a RuleTable,
    target: &ItemId,
    count: usize,
) -> Result<Vec<&'a Rule>, MiningError> {
    if count < 1 {
        return Err(MiningError::InvalidParameter(
            "recommendation count must be at least 1".to_owned(),
        ));
    }

    let selected: Vec<&Rule> = rules
        .sorted_by_lift()
        .into_iter()
        .filter(|rule| rule.antecedent().contains(target))
        .take(count)
        .collect();

    debug!(item = %target, requested = count, found = selected.len(), "recommendations selected");
    Ok(selected)
}
