use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cartwise_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

/// Config key, rendered value, primary env var and its alias.
type Field = (&'static str, String, &'static str, Option<&'static str>);

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc =
        config_file_path.as_deref().and_then(|path| load_config_file_doc(path).ok());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key, alias) in fields(&config) {
        let source = field_source(
            key,
            env_key,
            alias,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key, &value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let unset = || "<unset>".to_string();
    vec![
        (
            "mining.min_support",
            config.mining.min_support.to_string(),
            "CARTWISE_MINING_MIN_SUPPORT",
            None,
        ),
        ("mining.metric", config.mining.metric.to_string(), "CARTWISE_MINING_METRIC", None),
        (
            "mining.min_threshold",
            config.mining.min_threshold.to_string(),
            "CARTWISE_MINING_MIN_THRESHOLD",
            None,
        ),
        (
            "mining.max_len",
            config.mining.max_len.map_or_else(unset, |max_len| max_len.to_string()),
            "CARTWISE_MINING_MAX_LEN",
            None,
        ),
        ("mining.parallel", config.mining.parallel.to_string(), "CARTWISE_MINING_PARALLEL", None),
        (
            "prep.country",
            config.prep.country.clone().unwrap_or_else(unset),
            "CARTWISE_PREP_COUNTRY",
            None,
        ),
        ("prep.item_key", config.prep.item_key.to_string(), "CARTWISE_PREP_ITEM_KEY", None),
        (
            "prep.cancellation_marker",
            config.prep.cancellation_marker.clone(),
            "CARTWISE_PREP_CANCELLATION_MARKER",
            None,
        ),
        ("prep.lower_quantile", config.prep.lower_quantile.to_string(), "", None),
        ("prep.upper_quantile", config.prep.upper_quantile.to_string(), "", None),
        ("prep.iqr_multiplier", config.prep.iqr_multiplier.to_string(), "", None),
        ("recommend.count", config.recommend.count.to_string(), "CARTWISE_RECOMMEND_COUNT", None),
        (
            "logging.level",
            config.logging.level.clone(),
            "CARTWISE_LOGGING_LEVEL",
            Some("CARTWISE_LOG_LEVEL"),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            "CARTWISE_LOGGING_FORMAT",
            Some("CARTWISE_LOG_FORMAT"),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("cartwise.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/cartwise.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    raw.parse::<Value>().with_context(|| format!("parsing config file {}", path.display()))
}

fn field_source(
    key_path: &str,
    env_key: &str,
    alias: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_keys = [Some(env_key), alias];
    for env_key in env_keys.into_iter().flatten().filter(|key| !key.is_empty()) {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};
    use toml::Value;

    #[test]
    fn nested_keys_are_found_in_config_doc() {
        let doc: Value = "[mining]\nmin_support = 0.02\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "mining.min_support"));
        assert!(!contains_path(&doc, "mining.metric"));
        assert!(!contains_path(&doc, "prep.country"));
    }

    #[test]
    fn file_source_is_reported_without_env() {
        let doc: Value = "[prep]\niqr_multiplier = 3.0\n".parse().expect("valid toml");

        let source = field_source("prep.iqr_multiplier", "", None, Some(&doc), None);
        assert_eq!(source, "file (config file)");
        assert_eq!(field_source("prep.lower_quantile", "", None, Some(&doc), None), "default");
    }
}
