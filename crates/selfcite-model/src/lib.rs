//! Selfcite Model - logistic regression on self-citation pair tables
//!
//! Reads the long table written by the reshape stage, applies the filters
//! and derived columns in [`prepare`], builds a treatment-coded design
//! matrix from a formula and fits a binomial logit.
//!
//! Two targets are supported:
//! - [`Target::Pairs`]: does a citing author cite themself in this reference (`sc`)
//! - [`Target::Extreme`]: is the article highly self-citing (`highly_citing`)

pub mod error;
pub mod formula;
pub mod frame;
pub mod logit;
pub mod prepare;
pub mod report;

use std::path::Path;

pub use error::ModelError;
pub use formula::{Design, Formula};
pub use frame::{Column, Frame};
pub use logit::{LogitFit, fit_logit};
pub use prepare::{AuthFilter, ModelOptions, Target, prepare};
pub use report::ModelReport;

pub const PAIRS_FORMULA: &str = "sc ~ document_type + year_citing + time_lag + num_auth_citing \
    + num_ref_citing + academic_age + num_prev_papers + field \
    + C(affil_continent, Treatment(reference=\"Asia\")) + gender + auth_type \
    + year_citing:auth_type + gender:num_prev_papers";

pub const EXTREME_FORMULA: &str = "highly_citing ~ document_type + year_citing + num_auth_citing \
    + num_ref_citing + academic_age + num_prev_papers + field \
    + C(affil_continent, Treatment(reference=\"Asia\")) + gender + auth_type \
    + year_citing:auth_type + gender:num_prev_papers";

pub fn default_formula(target: Target) -> &'static str {
    match target {
        Target::Pairs => PAIRS_FORMULA,
        Target::Extreme => EXTREME_FORMULA,
    }
}

/// Fit a prepared table. `formula` defaults to [`default_formula`].
pub fn fit_frame(
    frame: Frame,
    options: &ModelOptions,
    formula: Option<&str>,
) -> Result<ModelReport, ModelError> {
    let text = formula.unwrap_or_else(|| default_formula(options.target));
    let parsed = Formula::parse(text)?;
    let table = prepare(frame, options)?;
    let design = parsed.design(&table)?;
    log::info!(
        "fitting {} on {} rows, {} coefficients",
        parsed.response,
        design.nobs(),
        design.names.len()
    );
    let fit = fit_logit(&design)?;
    Ok(ModelReport {
        formula: text.split_whitespace().collect::<Vec<_>>().join(" "),
        options: *options,
        fit,
        dropped: design.dropped,
    })
}

/// Read the long pair table at `input` and fit it.
pub fn run_model(
    input: &Path,
    options: &ModelOptions,
    formula: Option<&str>,
) -> Result<ModelReport, ModelError> {
    let frame = Frame::read_csv(input)?;
    if frame.is_empty() {
        return Err(ModelError::TooFewRows { rows: 0, columns: 1 });
    }
    fit_frame(frame, options, formula)
}
