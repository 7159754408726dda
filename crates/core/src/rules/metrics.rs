//! Association metrics for a rule `A -> C` over a frequent itemset `F = A ∪ C`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MiningError;

/// Metric used to filter generated rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
}

impl RuleMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Confidence => "confidence",
            Self::Lift => "lift",
            Self::Leverage => "leverage",
            Self::Conviction => "conviction",
        }
    }

    /// Reject thresholds outside the range the metric can take.
    pub fn validate_threshold(&self, threshold: f64) -> Result<(), MiningError> {
        let valid = match self {
            Self::Support | Self::Confidence => (0.0..=1.0).contains(&threshold),
            Self::Lift | Self::Conviction => threshold >= 0.0,
            Self::Leverage => (-1.0..=1.0).contains(&threshold),
        };
        if !valid {
            return Err(MiningError::InvalidParameter(format!(
                "{} threshold {threshold} is out of range",
                self.as_str()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleMetric {
    type Err = MiningError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "support" => Ok(Self::Support),
            "confidence" => Ok(Self::Confidence),
            "lift" => Ok(Self::Lift),
            "leverage" => Ok(Self::Leverage),
            "conviction" => Ok(Self::Conviction),
            other => Err(MiningError::InvalidParameter(format!(
                "unsupported metric `{other}` \
                 (expected support|confidence|lift|leverage|conviction)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RuleMetrics {
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of the whole itemset.
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `+inf` when confidence is exactly 1 (serialized as `null`).
    pub conviction: f64,
}

impl RuleMetrics {
    pub fn compute(antecedent_support: f64, consequent_support: f64, support: f64) -> Self {
        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Self {
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift,
            leverage,
            conviction,
        }
    }

    pub fn value(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction,
        }
    }
}
