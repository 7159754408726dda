pub mod config;
pub mod mine;
pub mod recommend;

use std::path::PathBuf;

use cartwise_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use cartwise_core::errors::{ApplicationError, DataError};
use cartwise_core::prep::{
    build_matrix, load_records, retail_data_prep, CleaningReport, ItemCatalog, ItemKey,
};
use cartwise_core::rules::RuleMetric;
use cartwise_core::TransactionMatrix;
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATA: u8 = 3;
pub const EXIT_MINING: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<T: Serialize> {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None::<()>)
    }

    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: Option<T>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            user_message: None,
            correlation_id: None,
            data: None::<()>,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Map a core failure onto the stable error class and exit code. The
    /// payload carries the interface-safe message and a correlation id that
    /// is also logged next to the full error.
    pub fn from_error(command: &str, error: ApplicationError) -> Self {
        let exit_code = match &error {
            ApplicationError::Mining(_) => EXIT_MINING,
            ApplicationError::Data(_) => EXIT_DATA,
            ApplicationError::Configuration(_) => EXIT_CONFIG,
        };
        let error_class = error.error_class();
        let message = error.to_string();
        let interface = error.into_interface(correlation_id(command));
        tracing::error!(
            command,
            error_class,
            correlation_id = interface.correlation_id(),
            error = %message,
            "command failed"
        );

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message,
            user_message: Some(interface.user_message().to_string()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: None::<()>,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn correlation_id(command: &str) -> String {
    format!("{command}-{}", Uuid::new_v4())
}

fn serialize_payload<T: Serialize>(payload: CommandOutcome<T>) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Flags shared by every command that runs the mining pipeline. Anything left
/// unset falls back to env, then the config file, then the defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct MiningArgs {
    #[arg(long, short = 'i', help = "Line records file (JSON array or JSON Lines)")]
    pub input: PathBuf,
    #[arg(long, help = "Config file path (defaults to cartwise.toml or config/cartwise.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Minimum itemset support in (0, 1]")]
    pub min_support: Option<f64>,
    #[arg(long, help = "Rule filter metric: support|confidence|lift|leverage|conviction")]
    pub metric: Option<RuleMetric>,
    #[arg(long, help = "Minimum value of the rule filter metric")]
    pub min_threshold: Option<f64>,
    #[arg(long, help = "Largest itemset size to mine")]
    pub max_len: Option<usize>,
    #[arg(long, help = "Only keep invoices from this country")]
    pub country: Option<String>,
    #[arg(long, help = "Item identity: stock_code|description")]
    pub item_key: Option<ItemKey>,
    #[arg(long, help = "Log level: trace|debug|info|warn|error")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MineArgs {
    #[command(flatten)]
    pub mining: MiningArgs,
    #[arg(long, help = "How many rules to print, best lift first")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub mining: MiningArgs,
    #[arg(long, help = "Target item id (stock code or description, per item key)")]
    pub item: String,
    #[arg(long, help = "How many recommendations to return")]
    pub count: Option<usize>,
}

impl MiningArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: self.overrides(),
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            min_support: self.min_support,
            metric: self.metric,
            min_threshold: self.min_threshold,
            max_len: self.max_len,
            country: self.country.clone(),
            item_key: self.item_key,
            log_level: self.log_level.clone(),
            ..ConfigOverrides::default()
        }
    }
}

/// Cleaned records turned into a basket matrix, plus what cleaning did.
pub struct PreparedBaskets {
    pub matrix: TransactionMatrix,
    pub catalog: ItemCatalog,
    pub cleaning: CleaningReport,
}

pub fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub fn prepare_baskets(
    args: &MiningArgs,
    config: &AppConfig,
) -> Result<PreparedBaskets, ApplicationError> {
    let records = load_records(&args.input)?;
    let (records, cleaning) = retail_data_prep(records, &config.prep.cleaning_options());
    if records.is_empty() {
        return Err(DataError::NothingLeft { dropped: cleaning.dropped() }.into());
    }

    let catalog = ItemCatalog::from_records(&records, config.prep.item_key);
    let matrix = build_matrix(&records, &config.prep.basket_options());
    Ok(PreparedBaskets { matrix, catalog, cleaning })
}
