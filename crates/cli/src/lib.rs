pub mod commands;

use std::process::ExitCode;

use cartwise_core::config::{AppConfig, LoadOptions};
use clap::{Parser, Subcommand};

use crate::commands::{MineArgs, RecommendArgs};

#[derive(Debug, Parser)]
#[command(
    name = "cartwise",
    about = "Cartwise market-basket CLI",
    long_about = "Mine association rules from retail invoice lines and recommend items bought together.",
    after_help = "Examples:\n  cartwise mine --input lines.json --country France\n  cartwise recommend --input lines.json --item 22492 --count 3\n  cartwise config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Clean records, mine frequent itemsets and print the strongest rules")]
    Mine(MineArgs),
    #[command(about = "Recommend items for a target item from freshly mined rules")]
    Recommend(RecommendArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let load_options = match &cli.command {
        Command::Mine(args) => args.mining.load_options(),
        Command::Recommend(args) => args.mining.load_options(),
        Command::Config => LoadOptions::default(),
    };
    init_logging(&load_options);

    let result = match cli.command {
        Command::Mine(args) => commands::mine::run(&args),
        Command::Recommend(args) => commands::recommend::run(&args),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr; stdout carries only the JSON payload. An invalid config
/// falls back to defaults here and is reported by the command itself.
fn init_logging(options: &LoadOptions) {
    use cartwise_core::config::LogFormat::*;
    use tracing::Level;

    let config = AppConfig::load(options.clone()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
