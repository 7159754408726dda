use cartwise_core::prep::ItemCatalog;
use cartwise_core::rules::Rule;
use cartwise_core::{pipeline, recommend_rules, ItemId, Itemset};
use serde::Serialize;
use tracing::info;

use crate::commands::{load_config, prepare_baskets, CommandResult, RecommendArgs};

#[derive(Debug, Serialize)]
struct Recommendation<'a> {
    items: &'a Itemset,
    descriptions: Vec<String>,
    lift: f64,
    confidence: f64,
    support: f64,
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    item: &'a ItemId,
    description: Option<&'a str>,
    requested: usize,
    recommendations: Vec<Recommendation<'a>>,
}

pub fn run(args: &RecommendArgs) -> CommandResult {
    let mut options = args.mining.load_options();
    options.overrides.recommend_count = args.count;
    let config = match load_config("recommend", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let prepared = match prepare_baskets(&args.mining, &config) {
        Ok(prepared) => prepared,
        Err(error) => return CommandResult::from_error("recommend", error),
    };

    let rules = match pipeline::mine_rules(&prepared.matrix, &config.mining.params()) {
        Ok(rules) => rules,
        Err(error) => return CommandResult::from_error("recommend", error.into()),
    };

    let target = ItemId::from(args.item.trim());
    let count = config.recommend.count;
    let selected = match recommend_rules(&rules, &target, count) {
        Ok(selected) => selected,
        Err(error) => return CommandResult::from_error("recommend", error.into()),
    };
    info!(item = %target, rules = rules.len(), found = selected.len(), "recommendations ready");

    let report = RecommendReport {
        item: &target,
        description: prepared.catalog.describe(&target),
        requested: count,
        recommendations: selected
            .into_iter()
            .map(|rule| describe_rule(rule, &prepared.catalog))
            .collect(),
    };

    let message = match report.recommendations.len() {
        0 => format!("no rule recommends anything for item {target}"),
        found => format!("{found} recommendation(s) for item {target}"),
    };
    CommandResult::success_with_data("recommend", message, Some(report))
}

fn describe_rule<'a>(rule: &'a Rule, catalog: &ItemCatalog) -> Recommendation<'a> {
    let metrics = rule.metrics();
    Recommendation {
        items: rule.consequent(),
        descriptions: catalog.describe_all(rule.consequent()),
        lift: metrics.lift,
        confidence: metrics.confidence,
        support: metrics.support,
    }
}
