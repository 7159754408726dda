use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::MiningParams;
use crate::prep::{BasketOptions, CappingOptions, CleaningOptions, ItemKey};
use crate::rules::RuleMetric;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub mining: MiningConfig,
    pub prep: PrepConfig,
    pub recommend: RecommendConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiningConfig {
    pub min_support: f64,
    pub metric: RuleMetric,
    pub min_threshold: f64,
    pub max_len: Option<usize>,
    pub parallel: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrepConfig {
    pub country: Option<String>,
    pub item_key: ItemKey,
    pub cancellation_marker: String,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    pub iqr_multiplier: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendConfig {
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub min_support: Option<f64>,
    pub metric: Option<RuleMetric>,
    pub min_threshold: Option<f64>,
    pub max_len: Option<usize>,
    pub country: Option<String>,
    pub item_key: Option<ItemKey>,
    pub recommend_count: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig {
                min_support: 0.01,
                metric: RuleMetric::Support,
                min_threshold: 0.01,
                max_len: None,
                parallel: true,
            },
            prep: PrepConfig {
                country: None,
                item_key: ItemKey::StockCode,
                cancellation_marker: "C".to_string(),
                lower_quantile: 0.01,
                upper_quantile: 0.99,
                iqr_multiplier: 1.5,
            },
            recommend: RecommendConfig { count: 1 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl MiningConfig {
    pub fn params(&self) -> MiningParams {
        MiningParams {
            min_support: self.min_support,
            metric: self.metric,
            min_threshold: self.min_threshold,
            max_len: self.max_len,
            parallel: self.parallel,
        }
    }
}

impl PrepConfig {
    pub fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            cancellation_marker: self.cancellation_marker.clone(),
            capping: CappingOptions {
                lower_quantile: self.lower_quantile,
                upper_quantile: self.upper_quantile,
                iqr_multiplier: self.iqr_multiplier,
            },
        }
    }

    pub fn basket_options(&self) -> BasketOptions {
        BasketOptions { country: self.country.clone(), item_key: self.item_key }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(metric) = mining.metric {
                self.mining.metric = metric;
            }
            if let Some(min_threshold) = mining.min_threshold {
                self.mining.min_threshold = min_threshold;
            }
            if let Some(max_len) = mining.max_len {
                self.mining.max_len = Some(max_len);
            }
            if let Some(parallel) = mining.parallel {
                self.mining.parallel = parallel;
            }
        }

        if let Some(prep) = patch.prep {
            if let Some(country) = prep.country {
                self.prep.country = Some(country);
            }
            if let Some(item_key) = prep.item_key {
                self.prep.item_key = item_key;
            }
            if let Some(cancellation_marker) = prep.cancellation_marker {
                self.prep.cancellation_marker = cancellation_marker;
            }
            if let Some(lower_quantile) = prep.lower_quantile {
                self.prep.lower_quantile = lower_quantile;
            }
            if let Some(upper_quantile) = prep.upper_quantile {
                self.prep.upper_quantile = upper_quantile;
            }
            if let Some(iqr_multiplier) = prep.iqr_multiplier {
                self.prep.iqr_multiplier = iqr_multiplier;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(count) = recommend.count {
                self.recommend.count = count;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTWISE_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_f64("CARTWISE_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_METRIC") {
            self.mining.metric = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "CARTWISE_MINING_METRIC".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MIN_THRESHOLD") {
            self.mining.min_threshold = parse_f64("CARTWISE_MINING_MIN_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MAX_LEN") {
            self.mining.max_len = Some(parse_usize("CARTWISE_MINING_MAX_LEN", &value)?);
        }
        if let Some(value) = read_env("CARTWISE_MINING_PARALLEL") {
            self.mining.parallel = parse_bool("CARTWISE_MINING_PARALLEL", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_PREP_COUNTRY") {
            self.prep.country = Some(value);
        }
        if let Some(value) = read_env("CARTWISE_PREP_ITEM_KEY") {
            self.prep.item_key = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "CARTWISE_PREP_ITEM_KEY".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("CARTWISE_PREP_CANCELLATION_MARKER") {
            self.prep.cancellation_marker = value;
        }

        if let Some(value) = read_env("CARTWISE_RECOMMEND_COUNT") {
            self.recommend.count = parse_usize("CARTWISE_RECOMMEND_COUNT", &value)?;
        }

        let log_level =
            read_env("CARTWISE_LOGGING_LEVEL").or_else(|| read_env("CARTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTWISE_LOGGING_FORMAT").or_else(|| read_env("CARTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(metric) = overrides.metric {
            self.mining.metric = metric;
        }
        if let Some(min_threshold) = overrides.min_threshold {
            self.mining.min_threshold = min_threshold;
        }
        if let Some(max_len) = overrides.max_len {
            self.mining.max_len = Some(max_len);
        }
        if let Some(country) = overrides.country {
            self.prep.country = Some(country);
        }
        if let Some(item_key) = overrides.item_key {
            self.prep.item_key = item_key;
        }
        if let Some(count) = overrides.recommend_count {
            self.recommend.count = count;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_mining(&self.mining)?;
        validate_prep(&self.prep)?;
        validate_recommend(&self.recommend)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartwise.toml"), PathBuf::from("config/cartwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    if !(mining.min_support > 0.0 && mining.min_support <= 1.0) {
        return Err(ConfigError::Validation(
            "mining.min_support must be in range (0, 1]".to_string(),
        ));
    }

    mining
        .metric
        .validate_threshold(mining.min_threshold)
        .map_err(|error| ConfigError::Validation(format!("mining.min_threshold: {error}")))?;

    if mining.max_len == Some(0) {
        return Err(ConfigError::Validation(
            "mining.max_len must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_prep(prep: &PrepConfig) -> Result<(), ConfigError> {
    let quantiles_ordered = (0.0..=1.0).contains(&prep.lower_quantile)
        && (0.0..=1.0).contains(&prep.upper_quantile)
        && prep.lower_quantile < prep.upper_quantile;
    if !quantiles_ordered {
        return Err(ConfigError::Validation(
            "prep.lower_quantile and prep.upper_quantile must satisfy 0 <= lower < upper <= 1"
                .to_string(),
        ));
    }

    if !(prep.iqr_multiplier >= 0.0 && prep.iqr_multiplier.is_finite()) {
        return Err(ConfigError::Validation(
            "prep.iqr_multiplier must be a non-negative number".to_string(),
        ));
    }

    if prep.country.as_deref().is_some_and(|country| country.trim().is_empty()) {
        return Err(ConfigError::Validation("prep.country must not be blank".to_string()));
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.count == 0 {
        return Err(ConfigError::Validation(
            "recommend.count must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    prep: Option<PrepPatch>,
    recommend: Option<RecommendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    metric: Option<RuleMetric>,
    min_threshold: Option<f64>,
    max_len: Option<usize>,
    parallel: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PrepPatch {
    country: Option<String>,
    item_key: Option<ItemKey>,
    cancellation_marker: Option<String>,
    lower_quantile: Option<f64>,
    upper_quantile: Option<f64>,
    iqr_multiplier: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
