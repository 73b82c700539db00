pub mod author;
pub mod journal;
pub mod model;
pub mod pairs;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use selfcite_collect::JournalYear;
use selfcite_collect::layout::parse_years;
use selfcite_scopus::ScopusClient;

use crate::config::Config;

/// Journal-year exports under a base directory.
#[derive(Args, Debug)]
pub struct UnitArgs {
    /// Base directory holding All_<field>/<journal>/ exports
    #[arg(short, long)]
    pub base: PathBuf,

    /// Fields to process (comma-separated, directory suffix after All_)
    #[arg(short, long, required = true, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Years to process, e.g. "2016-2018,2020" (all when omitted)
    #[arg(short, long)]
    pub years: Option<String>,
}

impl UnitArgs {
    pub fn discover(&self) -> Result<Vec<JournalYear>> {
        let years = match &self.years {
            Some(text) => parse_years(text)?,
            None => Vec::new(),
        };
        let units = selfcite_collect::discover(&self.base, &self.fields, &years)?;
        if units.is_empty() {
            anyhow::bail!(
                "no journal-year exports for {} under {}",
                self.fields.join(","),
                self.base.display()
            );
        }
        log::info!("{} journal-years to process", units.len());
        Ok(units)
    }
}

pub fn scopus_client(config: &Config) -> Result<ScopusClient> {
    ScopusClient::new(config.scopus_config()).context("cannot create Scopus client")
}
