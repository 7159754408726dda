pub mod config;
pub mod domain;
pub mod errors;
pub mod matrix;
pub mod mining;
pub mod pipeline;
pub mod prep;
pub mod recommend;
pub mod rules;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::item::ItemId;
pub use domain::itemset::Itemset;
pub use errors::{ApplicationError, DataError, ErrorKind, InterfaceError, MiningError};
pub use matrix::TransactionMatrix;
pub use mining::{FrequentItemset, FrequentItemsetTable, ItemsetMiner};
pub use pipeline::{mine_rules, MiningParams, MiningRun};
pub use recommend::{recommend, recommend_rules};
pub use rules::{Rule, RuleGenerator, RuleMetric, RuleMetrics, RuleTable};
