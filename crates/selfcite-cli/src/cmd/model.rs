//! Reshape and model subcommands - long table and logistic fit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use selfcite_collect::{ReshapeOptions, run_reshape};
use selfcite_core::{SharedProgress, fmt_num};
use selfcite_model::{ModelOptions, run_model};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ReshapeArgs {
    /// Directory of pair files written by `pairs`
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output CSV (default: <output dir>/long.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// `name,gender` lookup table for first given names
    #[arg(short, long)]
    pub genders: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Long table written by `reshape` (default: <output dir>/long.csv)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Observation unit and response
    #[arg(short, long, value_enum, default_value = "pairs")]
    pub target: ModelTarget,

    /// Restrict to first or last citing authors
    #[arg(short, long, value_enum, default_value = "all")]
    pub auth: AuthKind,

    /// Keep count columns untransformed instead of asinh
    #[arg(long)]
    pub no_transform: bool,

    /// Model formula (default: built-in formula for the target)
    #[arg(short, long)]
    pub formula: Option<String>,

    /// Directory for the coefficient table
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, ValueEnum, Debug)]
pub enum ModelTarget {
    /// One observation per citing/cited pair
    Pairs,
    /// One observation per article and author type
    Extreme,
}

impl From<ModelTarget> for selfcite_model::Target {
    fn from(t: ModelTarget) -> Self {
        match t {
            ModelTarget::Pairs => selfcite_model::Target::Pairs,
            ModelTarget::Extreme => selfcite_model::Target::Extreme,
        }
    }
}

#[derive(Clone, ValueEnum, Debug)]
pub enum AuthKind {
    Fa,
    La,
    All,
}

impl From<AuthKind> for selfcite_model::AuthFilter {
    fn from(a: AuthKind) -> Self {
        match a {
            AuthKind::Fa => selfcite_model::AuthFilter::Fa,
            AuthKind::La => selfcite_model::AuthFilter::La,
            AuthKind::All => selfcite_model::AuthFilter::All,
        }
    }
}

pub fn reshape(args: ReshapeArgs, config: &Config) -> Result<()> {
    let options = ReshapeOptions {
        input_dir: args
            .input
            .unwrap_or_else(|| config.output.default_dir.join("pairs")),
        output: args
            .output
            .unwrap_or_else(|| config.output.default_dir.join("long.csv")),
        gender_csv: args.genders,
    };
    let report = run_reshape(&options)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Reshape").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table.add_row(vec!["Pair files", &fmt_num(report.files)]);
    table.add_row(vec!["Pairs", &fmt_num(report.pairs)]);
    table.add_row(vec!["Rows", &fmt_num(report.rows)]);
    table.add_row(vec!["Unknown continent", &fmt_num(report.unknown_continent)]);
    table.add_row(vec!["Unknown gender", &fmt_num(report.unknown_gender)]);
    table.add_row(vec!["Output", &options.output.display().to_string()]);
    eprintln!("\n{table}");
    Ok(())
}

pub fn run(args: ModelArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let input = args
        .input
        .unwrap_or_else(|| config.output.default_dir.join("long.csv"));
    let options = ModelOptions {
        target: args.target.into(),
        auth: args.auth.into(),
        transform: !args.no_transform,
    };
    let report = run_model(&input, &options, args.formula.as_deref())
        .with_context(|| format!("cannot fit model on {}", input.display()))?;

    let out_dir = args.output.unwrap_or_else(|| config.output.default_dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    report.write_csv(&out_dir.join(report.file_name()))?;
    report.report(progress.is_tty());
    Ok(())
}
