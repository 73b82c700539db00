//! selfcite - Scopus self-citation pipelines
//!
//! Collects self-citation metrics for single authors and journal-year
//! exports, builds the citing/cited pair dataset and fits the logistic
//! models on it.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "selfcite")]
#[command(about = "Self-citation metrics from Scopus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./selfcite.toml or ~/.config/selfcite/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Retry attempts for quota and server errors (0 skips the record)
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Minimum milliseconds between Scopus requests
    #[arg(long, global = true)]
    min_interval_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Self-citation history of one author
    Author(cmd::author::AuthorArgs),
    /// Article-level self-citation counts for journal-year exports
    Journal(cmd::journal::JournalArgs),
    /// Citing/cited pair dataset for journal-year exports
    Pairs(cmd::pairs::PairsArgs),
    /// Append career columns of first and last authors to journal results
    AuthorInfo(cmd::journal::AuthorInfoArgs),
    /// Merge pair files into the long table used by `model`
    Reshape(cmd::model::ReshapeArgs),
    /// Fit the self-citation logistic model
    Model(cmd::model::ModelArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    selfcite_core::install_signal_handlers().context("cannot install signal handlers")?;

    // Progress context (TTY auto-detect)
    let progress = Arc::new(selfcite_core::ProgressContext::new());

    // Logging:
    //   TTY:     warn unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    selfcite_core::init_logging(selfcite_core::Verbosity::detect(is_tty, cli.debug), multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    selfcite_core::set_http_config(config.http_config(
        cli.timeout,
        cli.max_retries,
        cli.min_interval_ms,
    ));

    match cli.command {
        Command::Author(args) => cmd::author::run(args, &config, &progress),
        Command::Journal(args) => cmd::journal::run(args, &config, &progress),
        Command::Pairs(args) => cmd::pairs::run(args, &config, &progress),
        Command::AuthorInfo(args) => cmd::journal::run_author_info(args, &config, &progress),
        Command::Reshape(args) => cmd::model::reshape(args, &config),
        Command::Model(args) => cmd::model::run(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            let http = selfcite_core::http_config();
            table.add_row(vec![
                "Output directory",
                &config.output.default_dir.display().to_string(),
            ]);
            table.add_row(vec!["Scopus API URL", &config.scopus.api_url]);
            table.add_row(vec![
                "Scopus API key",
                if config.scopus.api_key.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec![
                "Institution token",
                if config.scopus.inst_token.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec![
                "Cache directory",
                &config
                    .scopus
                    .cache_dir
                    .as_ref()
                    .map_or("disabled".to_string(), |d| d.display().to_string()),
            ]);
            table.add_row(vec![
                "Cache refresh",
                &format!("{} days", config.scopus.refresh_days),
            ]);
            table.add_row(vec!["Timeout", &format!("{}s", http.timeout.as_secs())]);
            table.add_row(vec!["Max retries", &http.max_retries.to_string()]);
            table.add_row(vec![
                "Min interval",
                &format!("{}ms", http.min_interval.as_millis()),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
