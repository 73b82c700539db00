//! Journal and author-info subcommands - per-article metrics for journal-year exports

use anyhow::Result;
use clap::Args;

use selfcite_collect::{JournalOptions, RunStats, run_journal};
use selfcite_core::{SharedProgress, is_shutdown_requested};

use super::UnitArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct JournalArgs {
    #[command(flatten)]
    pub units: UnitArgs,

    /// Skip journal-years whose results file already exists
    #[arg(long)]
    pub skip_existing: bool,
}

#[derive(Args, Debug)]
pub struct AuthorInfoArgs {
    #[command(flatten)]
    pub units: UnitArgs,
}

pub fn run(args: JournalArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let units = args.units.discover()?;
    let client = super::scopus_client(config)?;
    let options = JournalOptions {
        skip_existing: args.skip_existing,
    };

    let mut total = RunStats::default();
    for unit in &units {
        if is_shutdown_requested() {
            total.interrupted = true;
            break;
        }
        match run_journal(&client, unit, options, progress) {
            Ok(stats) => total.merge(&stats),
            // Keep going with the remaining journal-years
            Err(e) => log::error!("{}: {e:#}", unit.stem()),
        }
    }

    total.report("Journal", progress.is_tty());
    if total.interrupted {
        anyhow::bail!("interrupted, partial results written");
    }
    Ok(())
}

pub fn run_author_info(args: AuthorInfoArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let units = args.units.discover()?;
    let client = super::scopus_client(config)?;
    let stats = selfcite_collect::run_author_info(&client, &units, progress)?;
    stats.report("Author info", progress.is_tty());
    if stats.interrupted {
        anyhow::bail!("interrupted, partial results written");
    }
    Ok(())
}
