//! Pairs subcommand - citing/cited pair dataset

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use selfcite_collect::{PairOptions, run_pairs};
use selfcite_core::SharedProgress;

use super::UnitArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PairsArgs {
    #[command(flatten)]
    pub units: UnitArgs,

    /// Output directory for <journal><year>.csv pair files
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: PairsArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let units = args.units.discover()?;
    let client = super::scopus_client(config)?;
    let options = PairOptions {
        out_dir: args
            .output
            .unwrap_or_else(|| config.output.default_dir.join("pairs")),
    };

    let stats = run_pairs(&client, &units, &options, progress)?;
    stats.report("Pairs", progress.is_tty());
    if stats.interrupted {
        anyhow::bail!("interrupted, rerun to resume");
    }
    Ok(())
}
