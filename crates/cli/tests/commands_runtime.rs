use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use cartwise_cli::commands::{config, mine, recommend, MineArgs, MiningArgs, RecommendArgs};
use cartwise_core::prep::ItemKey;
use serde_json::Value;
use tempfile::TempDir;

const BASKETS: &[(&str, &str, &str)] = &[
    ("536365", "A", "France"),
    ("536365", "B", "France"),
    ("536366", "A", "France"),
    ("536366", "B", "France"),
    ("536366", "C", "France"),
    ("536367", "A", "France"),
    ("536368", "B", "France"),
    ("536368", "C", "France"),
    ("C536369", "A", "France"),
    ("536370", "C", "Germany"),
];

#[test]
fn mine_reports_itemsets_and_rules() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = MineArgs {
            mining: MiningArgs {
                input,
                min_support: Some(0.5),
                country: Some("France".to_string()),
                ..MiningArgs::default()
            },
            limit: None,
        };

        let result = mine::run(&args);
        assert_eq!(result.exit_code, 0, "expected successful mining run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "mine");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["transactions"], 4);
        assert_eq!(payload["data"]["itemsets"], 5);
        assert_eq!(payload["data"]["max_itemset_len"], 2);
        assert_eq!(payload["data"]["rules"], 4);
        assert_eq!(payload["data"]["cleaning"]["cancelled"], 1);
    });
}

#[test]
fn mine_limits_printed_rules_best_lift_first() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = MineArgs {
            mining: MiningArgs {
                input,
                min_support: Some(0.5),
                country: Some("France".to_string()),
                ..MiningArgs::default()
            },
            limit: Some(1),
        };

        let payload = parse_payload(&mine::run(&args).output);
        let top = payload["data"]["top_rules"].as_array().cloned().unwrap_or_default();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["antecedent"], serde_json::json!(["B"]));
        assert_eq!(top[0]["consequent"], serde_json::json!(["C"]));
    });
}

#[test]
fn mine_reads_thresholds_from_env() {
    with_env(&[("CARTWISE_MINING_MIN_SUPPORT", "0.5"), ("CARTWISE_PREP_COUNTRY", "France")], || {
        let (_dir, input) = write_records();
        let result = mine::run(&mine_args(MiningArgs { input, ..MiningArgs::default() }));

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["itemsets"], 5);
    });
}

#[test]
fn mine_returns_data_failure_for_missing_input() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let args = MiningArgs { input: dir.path().join("absent.json"), ..MiningArgs::default() };

        let result = mine::run(&mine_args(args));
        assert_eq!(result.exit_code, 3, "expected data failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "data_input");
        assert_eq!(
            payload["user_message"],
            "The request could not be processed. Check inputs and try again."
        );
        let correlation_id = payload["correlation_id"].as_str().unwrap_or_default();
        assert!(correlation_id.starts_with("mine-"), "unexpected id {correlation_id}");
    });
}

#[test]
fn mine_returns_config_failure_for_out_of_range_support() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = MiningArgs { input, min_support: Some(1.5), ..MiningArgs::default() };

        let result = mine::run(&mine_args(args));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn mine_returns_mining_failure_when_country_has_no_invoices() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args =
            MiningArgs { input, country: Some("Spain".to_string()), ..MiningArgs::default() };

        let result = mine::run(&mine_args(args));
        assert_eq!(result.exit_code, 4, "expected mining failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "empty_input");
        assert!(payload["correlation_id"].is_string());
    });
}

#[test]
fn mine_rejects_unknown_log_level_override() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args =
            MiningArgs { input, log_level: Some("verbose".to_string()), ..MiningArgs::default() };

        let result = mine::run(&mine_args(args));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("logging.level"), "unexpected message {message}");
    });
}

#[test]
fn recommend_ranks_consequents_by_lift() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = RecommendArgs {
            mining: MiningArgs {
                input,
                min_support: Some(0.5),
                country: Some("France".to_string()),
                ..MiningArgs::default()
            },
            item: "B".to_string(),
            count: Some(2),
        };

        let result = recommend::run(&args);
        assert_eq!(result.exit_code, 0, "expected successful recommendation");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["data"]["description"], "item B");
        let items: Vec<Value> = payload["data"]["recommendations"]
            .as_array()
            .map(|found| found.iter().map(|entry| entry["items"].clone()).collect())
            .unwrap_or_default();
        assert_eq!(items, vec![serde_json::json!(["C"]), serde_json::json!(["A"])]);
        assert_eq!(
            payload["data"]["recommendations"][0]["descriptions"],
            serde_json::json!(["item C"])
        );
    });
}

#[test]
fn recommend_matches_padded_descriptions() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let input = dir.path().join("doorstops.jsonl");
        let lines: Vec<String> = [("1", "ROSE DOORSTOP "), ("1", "MUG"), ("2", "ROSE DOORSTOP ")]
            .iter()
            .map(|(invoice, description)| {
                record_line(invoice, &format!("SKU-{}", description.trim()), description, "France")
            })
            .collect();
        fs::write(&input, lines.join("\n")).expect("fixture written");

        let args = RecommendArgs {
            mining: MiningArgs {
                input,
                min_support: Some(0.5),
                item_key: Some(ItemKey::Description),
                ..MiningArgs::default()
            },
            item: "ROSE DOORSTOP ".to_string(),
            count: None,
        };

        let result = recommend::run(&args);
        assert_eq!(result.exit_code, 0, "expected successful recommendation");

        let payload = parse_payload(&result.output);
        let found = payload["data"]["recommendations"].as_array().cloned().unwrap_or_default();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["items"], serde_json::json!(["MUG"]));
        assert_eq!(payload["data"]["description"], "ROSE DOORSTOP");
    });
}

#[test]
fn recommend_unknown_item_is_empty_success() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = RecommendArgs {
            mining: MiningArgs { input, min_support: Some(0.5), ..MiningArgs::default() },
            item: "Z".to_string(),
            count: None,
        };

        let result = recommend::run(&args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["requested"], 1);
        assert_eq!(payload["data"]["recommendations"], serde_json::json!([]));
    });
}

#[test]
fn recommend_rejects_zero_count_as_config_failure() {
    with_env(&[], || {
        let (_dir, input) = write_records();
        let args = RecommendArgs {
            mining: MiningArgs { input, ..MiningArgs::default() },
            item: "A".to_string(),
            count: Some(0),
        };

        let result = recommend::run(&args);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_sources() {
    with_env(&[("CARTWISE_MINING_METRIC", "lift"), ("CARTWISE_MINING_MIN_THRESHOLD", "1.2")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("- mining.metric = lift (source: env (CARTWISE_MINING_METRIC))"));
        assert!(message.contains("- mining.min_support = 0.01 (source: default)"));
        assert!(message.contains("- recommend.count = 1 (source: default)"));
    });
}

#[test]
fn config_returns_failure_for_invalid_env() {
    with_env(&[("CARTWISE_RECOMMEND_COUNT", "many")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn mine_args(mining: MiningArgs) -> MineArgs {
    MineArgs { mining, limit: None }
}

fn record_line(invoice: &str, code: &str, description: &str, country: &str) -> String {
    serde_json::json!({
        "Invoice": invoice,
        "StockCode": code,
        "Description": description,
        "Quantity": 1,
        "Price": 2.5,
        "Customer ID": 12583.0,
        "Country": country,
    })
    .to_string()
}

fn write_records() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("lines.jsonl");
    let lines: Vec<String> = BASKETS
        .iter()
        .map(|(invoice, code, country)| {
            record_line(invoice, code, &format!("item {code}"), country)
        })
        .collect();
    fs::write(&path, lines.join("\n")).expect("fixture written");
    (dir, path)
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARTWISE_MINING_MIN_SUPPORT",
        "CARTWISE_MINING_METRIC",
        "CARTWISE_MINING_MIN_THRESHOLD",
        "CARTWISE_MINING_MAX_LEN",
        "CARTWISE_MINING_PARALLEL",
        "CARTWISE_PREP_COUNTRY",
        "CARTWISE_PREP_ITEM_KEY",
        "CARTWISE_PREP_CANCELLATION_MARKER",
        "CARTWISE_RECOMMEND_COUNT",
        "CARTWISE_LOGGING_LEVEL",
        "CARTWISE_LOGGING_FORMAT",
        "CARTWISE_LOG_LEVEL",
        "CARTWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
