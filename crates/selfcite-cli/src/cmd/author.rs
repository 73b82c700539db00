//! Author subcommand - self-citation history of one author

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use selfcite_collect::{AuthorOptions, run_author};
use selfcite_core::SharedProgress;
use selfcite_match::AuthorId;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct AuthorArgs {
    /// Scopus author ID
    pub auid: AuthorId,

    /// Match cited works without author IDs on surname and first initial
    #[arg(long)]
    pub allow_initial: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn percent(rate: Option<f64>) -> String {
    rate.map_or("n/a".to_string(), |r| format!("{:.2}%", r * 100.0))
}

pub fn run(args: AuthorArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let client = super::scopus_client(config)?;
    let options = AuthorOptions {
        auid: args.auid,
        allow_initial: args.allow_initial,
        out_dir: args
            .output
            .unwrap_or_else(|| config.output.default_dir.clone()),
    };
    let report = run_author(&client, &options, progress)?;

    let title = report.profile.ref_style_name();
    report.stats.report(&title, progress.is_tty());
    let summary = format!(
        "{title}: self-citation rate {} (any co-author {}), written to {}",
        percent(report.overall_rate()),
        percent(report.overall_rate_any()),
        report.path.display()
    );
    if progress.is_tty() {
        eprintln!("{}", report.format_year_table());
        eprintln!("{summary}");
    } else {
        log::info!("{summary}");
    }

    if report.stats.interrupted {
        anyhow::bail!("interrupted, partial results written");
    }
    Ok(())
}
