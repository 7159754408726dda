use std::fmt;

use serde::Serialize;

use super::metrics::RuleMetrics;
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;

/// An association rule `antecedent -> consequent`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rule {
    antecedent: Itemset,
    consequent: Itemset,
    #[serde(flatten)]
    metrics: RuleMetrics,
}

impl Rule {
    pub fn new(
        antecedent: Itemset,
        consequent: Itemset,
        metrics: RuleMetrics,
    ) -> Result<Self, MiningError> {
        if antecedent.is_empty() || consequent.is_empty() {
            return Err(MiningError::MalformedItemset(format!(
                "rule {antecedent} -> {consequent} has an empty side"
            )));
        }
        if !antecedent.is_disjoint(&consequent) {
            return Err(MiningError::MalformedItemset(format!(
                "rule {antecedent} -> {consequent} has overlapping sides"
            )));
        }
        Ok(Self { antecedent, consequent, metrics })
    }

    pub fn antecedent(&self) -> &Itemset {
        &self.antecedent
    }

    pub fn consequent(&self) -> &Itemset {
        &self.consequent
    }

    pub fn metrics(&self) -> &RuleMetrics {
        &self.metrics
    }

    pub fn lift(&self) -> f64 {
        self.metrics.lift
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.antecedent, self.consequent)
    }
}

/// Rules from one mining run, in generation order. Not deduplicated: one
/// antecedent can appear with several consequents.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Rules ordered by lift, highest first. The sort is stable, so equal lifts
    /// keep generation order.
    pub fn sorted_by_lift(&self) -> Vec<&Rule> {
        let mut sorted: Vec<&Rule> = self.rules.iter().collect();
        sorted.sort_by(|a, b| b.lift().total_cmp(&a.lift()));
        sorted
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
