//! Row filters and derived columns applied before fitting.

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::frame::{Column, Frame};

/// Self-citation rate at or above which an article counts as highly self-citing.
pub const EXTREME_THRESHOLD: f64 = 0.25;
/// Rates strictly between this and [`EXTREME_THRESHOLD`] are left out.
pub const EXTREME_GAP_LOW: f64 = 0.15;
/// Extreme target only considers articles with at least this many references.
pub const EXTREME_MIN_REFS: f64 = 30.0;

const MAX_TIME_LAG: f64 = 150.0;
const MAX_ACADEMIC_AGE: f64 = 90.0;
const YEAR_OFFSET: f64 = 2000.0;

/// Count columns put through `asinh` when transforming.
pub const TRANSFORMED: [&str; 5] = [
    "num_auth_citing",
    "num_ref_citing",
    "num_prev_papers",
    "time_lag",
    "academic_age",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One observation per citing/cited pair, response `sc`
    Pairs,
    /// One observation per article and author type, response `highly_citing`
    Extreme,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pairs => "pairs",
            Self::Extreme => "extreme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFilter {
    Fa,
    La,
    All,
}

impl AuthFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fa => "fa",
            Self::La => "la",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    pub target: Target,
    pub auth: AuthFilter,
    pub transform: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            target: Target::Pairs,
            auth: AuthFilter::All,
            transform: true,
        }
    }
}

fn in_range(value: Option<f64>, low: f64, high: f64) -> bool {
    value.is_some_and(|v| v >= low && v <= high)
}

/// Turn the long pair table into the model table for `options.target`.
pub fn prepare(mut frame: Frame, options: &ModelOptions) -> Result<Frame, ModelError> {
    let before = frame.len();

    let time_lag: Vec<Option<f64>> = frame
        .numeric("year_citing")?
        .iter()
        .zip(frame.numeric("year_cited")?)
        .map(|(a, b)| Some((*a)? - (*b)?))
        .collect();
    frame.set_column("time_lag", Column::Numeric(time_lag))?;

    let mask: Vec<bool> = frame
        .numeric("time_lag")?
        .iter()
        .zip(frame.numeric("academic_age")?)
        .map(|(&lag, &age)| in_range(lag, 0.0, MAX_TIME_LAG) && in_range(age, 0.0, MAX_ACADEMIC_AGE))
        .collect();
    frame.retain(&mask);
    frame.drop_column("num_auth_cited");
    log::debug!("time lag and age filters: {before} -> {} rows", frame.len());

    if options.target == Target::Extreme {
        let mask: Vec<bool> = frame
            .numeric("num_ref_citing")?
            .iter()
            .map(|n| n.is_some_and(|n| n >= EXTREME_MIN_REFS))
            .collect();
        frame.retain(&mask);
    }
    frame.map_numeric("year_citing", |y| y - YEAR_OFFSET)?;

    if options.auth != AuthFilter::All {
        let wanted = options.auth.as_str();
        let mask: Vec<bool> = frame
            .text("auth_type")?
            .iter()
            .map(|t| t.as_deref() == Some(wanted))
            .collect();
        frame.retain(&mask);
    }

    if options.target == Target::Extreme {
        frame = summarize_articles(&frame)?;
    }

    let mask: Vec<bool> = frame
        .numeric("num_auth_citing")?
        .iter()
        .map(|n| *n != Some(1.0))
        .collect();
    frame.retain(&mask);

    if options.transform {
        for name in TRANSFORMED {
            if frame.has_column(name) {
                frame.map_numeric(name, f64::asinh)?;
            }
        }
    }

    log::info!(
        "{} model table: {} of {before} rows",
        options.target.as_str(),
        frame.len()
    );
    Ok(frame)
}

/// One row per `(eid_citing, auth_type)`: the group's first row plus
/// `sc_total`, `sc_rate` and `highly_citing`. Groups come out sorted by key.
fn summarize_articles(frame: &Frame) -> Result<Frame, ModelError> {
    let eids = frame.text("eid_citing")?;
    let auth = frame.text("auth_type")?;
    let sc = frame.numeric("sc")?;

    // key -> (first row, sum of present sc values)
    let mut groups: BTreeMap<(String, String), (usize, f64)> = BTreeMap::new();
    for row in 0..frame.len() {
        let (Some(eid), Some(auth)) = (&eids[row], &auth[row]) else {
            continue;
        };
        let entry = groups.entry((eid.clone(), auth.clone())).or_insert((row, 0.0));
        entry.1 += sc[row].unwrap_or(0.0);
    }

    let rows: Vec<usize> = groups.values().map(|&(row, _)| row).collect();
    let totals: Vec<Option<f64>> = groups.values().map(|&(_, total)| Some(total)).collect();
    let mut summary = frame.take(&rows);
    let num_ref = summary.numeric("num_ref_citing")?.to_vec();

    let rates: Vec<Option<f64>> = totals
        .iter()
        .zip(&num_ref)
        .map(|(total, n)| match (total, n) {
            (Some(t), Some(n)) if *n > 0.0 => Some(t / n),
            _ => None,
        })
        .collect();
    let highly: Vec<Option<f64>> = rates.iter().map(|r| r.and_then(highly_citing)).collect();

    summary.set_column("sc_total", Column::Numeric(totals))?;
    summary.set_column("sc_rate", Column::Numeric(rates))?;
    summary.set_column("highly_citing", Column::Numeric(highly))?;
    log::debug!("{} article/author groups", summary.len());
    Ok(summary)
}

/// `1` at or above the threshold, `0` at or below the lower bound, missing in between.
pub fn highly_citing(rate: f64) -> Option<f64> {
    if rate >= EXTREME_THRESHOLD {
        Some(1.0)
    } else if rate > EXTREME_GAP_LOW {
        None
    } else {
        Some(0.0)
    }
}
