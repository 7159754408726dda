use cartwise_core::pipeline;
use cartwise_core::prep::CleaningReport;
use cartwise_core::rules::Rule;
use serde::Serialize;

use crate::commands::{load_config, prepare_baskets, CommandResult, MineArgs};

const DEFAULT_RULE_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
struct MineSummary<'a> {
    transactions: usize,
    items: usize,
    cleaning: &'a CleaningReport,
    itemsets: usize,
    max_itemset_len: usize,
    rules: usize,
    top_rules: Vec<&'a Rule>,
}

pub fn run(args: &MineArgs) -> CommandResult {
    let config = match load_config("mine", args.mining.load_options()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let prepared = match prepare_baskets(&args.mining, &config) {
        Ok(prepared) => prepared,
        Err(error) => return CommandResult::from_error("mine", error),
    };

    let mined = match pipeline::run(&prepared.matrix, &config.mining.params()) {
        Ok(mined) => mined,
        Err(error) => return CommandResult::from_error("mine", error.into()),
    };

    let limit = args.limit.unwrap_or(DEFAULT_RULE_LIMIT);
    let summary = MineSummary {
        transactions: prepared.matrix.transaction_count(),
        items: prepared.matrix.item_count(),
        cleaning: &prepared.cleaning,
        itemsets: mined.itemsets.len(),
        max_itemset_len: mined.itemsets.max_len(),
        rules: mined.rules.len(),
        top_rules: mined.rules.sorted_by_lift().into_iter().take(limit).collect(),
    };

    let message = format!(
        "mined {} frequent itemsets and {} rules from {} transactions",
        summary.itemsets, summary.rules, summary.transactions
    );
    CommandResult::success_with_data("mine", message, Some(summary))
}
