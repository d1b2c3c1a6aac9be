//! # Cache Configuration Validator
//!
//! Command-line tool for checking a cache configuration file (plus any
//! `CACHEMEM__*` overrides) before deploying it.

use cachemem::config::ConfigLoader;
use cachemem::CacheConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate cachemem configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (toml, yaml or json); environment only when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for the effective configuration
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }

    match loader.load() {
        Ok(config) => {
            info!("Configuration is valid");
            if let Err(e) = print_config(&config, cli.format) {
                error!(error = %e, "Failed to render configuration");
                process::exit(2);
            }
        }
        Err(e) => {
            error!(error = %e, "Configuration is invalid");
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}

fn print_config(config: &CacheConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Table => {
            let response_timeout = config
                .response_timeout_ms
                .map_or_else(|| "none".to_string(), |ms| format!("{ms}ms"));
            println!("✅ Configuration valid");
            println!("  {:<28} {}", "enabled", config.enabled);
            println!("  {:<28} {}", "remote", config.redis_url());
            println!("  {:<28} {}ms", "connect_timeout", config.connect_timeout_ms);
            println!("  {:<28} {}", "response_timeout", response_timeout);
            println!(
                "  {:<28} {}s",
                "default_expiration", config.default_expiration_seconds
            );
        }
    }
    Ok(())
}
