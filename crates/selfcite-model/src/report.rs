//! Coefficient table output.

use std::path::Path;

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::Serialize;

use crate::error::ModelError;
use crate::logit::LogitFit;
use crate::prepare::ModelOptions;

/// Fitted model with the formula and options that produced it.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub formula: String,
    pub options: ModelOptions,
    pub fit: LogitFit,
    /// Rows of the prepared table left out for missing values
    pub dropped: usize,
}

#[derive(Debug, Serialize)]
struct CoefRow<'a> {
    term: &'a str,
    coef: f64,
    std_err: f64,
    z: f64,
    p_value: f64,
    ci_low: f64,
    ci_high: f64,
}

impl ModelReport {
    /// `model_<target>_<auth>.csv`
    pub fn file_name(&self) -> String {
        format!(
            "model_{}_{}.csv",
            self.options.target.as_str(),
            self.options.auth.as_str()
        )
    }

    fn rows(&self) -> impl Iterator<Item = CoefRow<'_>> {
        let fit = &self.fit;
        (0..fit.names.len()).map(move |i| CoefRow {
            term: &fit.names[i],
            coef: fit.params[i],
            std_err: fit.std_err[i],
            z: fit.z[i],
            p_value: fit.p_values[i],
            ci_low: fit.conf_int[i].0,
            ci_high: fit.conf_int[i].1,
        })
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ModelError> {
        let write_err = |source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        for row in self.rows() {
            writer.serialize(row).map_err(write_err)?;
        }
        writer
            .flush()
            .map_err(|e| write_err(csv::Error::from(e)))?;
        log::info!("wrote {} coefficients to {}", self.fit.names.len(), path.display());
        Ok(())
    }

    /// Format coefficient table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Term").fg(Color::Cyan).add_attribute(Attribute::Bold),
                Cell::new("Coef").fg(Color::Cyan),
                Cell::new("Std err").fg(Color::Cyan),
                Cell::new("z").fg(Color::Cyan),
                Cell::new("P>|z|").fg(Color::Cyan),
                Cell::new("[0.025").fg(Color::Cyan),
                Cell::new("0.975]").fg(Color::Cyan),
            ]);
        for row in self.rows() {
            let p = Cell::new(format!("{:.3}", row.p_value));
            table.add_row(vec![
                Cell::new(row.term),
                Cell::new(format!("{:.4}", row.coef)),
                Cell::new(format!("{:.4}", row.std_err)),
                Cell::new(format!("{:.3}", row.z)),
                if row.p_value < 0.05 { p.fg(Color::Green) } else { p },
                Cell::new(format!("{:.4}", row.ci_low)),
                Cell::new(format!("{:.4}", row.ci_high)),
            ]);
        }
        format!("\n{}\n{table}\n{}", self.formula, self.summary_line())
    }

    fn summary_line(&self) -> String {
        let fit = &self.fit;
        format!(
            "n = {}, dropped = {}, log-likelihood = {:.3}, null = {:.3}, pseudo R2 = {:.4}, {} after {} iterations",
            fit.nobs,
            self.dropped,
            fit.llf,
            fit.llnull,
            fit.pseudo_r2(),
            if fit.converged { "converged" } else { "NOT converged" },
            fit.iterations
        )
    }

    /// Log minimal summary (non-TTY mode).
    pub fn log(&self) {
        log::info!("{}", self.formula);
        log::info!("{}", self.summary_line());
        for row in self.rows() {
            log::info!(
                "{}: coef {:.4} se {:.4} p {:.3}",
                row.term,
                row.coef,
                row.std_err,
                row.p_value
            );
        }
    }

    pub fn report(&self, is_tty: bool) {
        if is_tty {
            eprintln!("{}", self.format_table());
        } else {
            self.log();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::{AuthFilter, Target};
    use ndarray::Array1;

    fn report() -> ModelReport {
        ModelReport {
            formula: "sc ~ x".into(),
            options: ModelOptions {
                target: Target::Extreme,
                auth: AuthFilter::La,
                transform: true,
            },
            fit: LogitFit {
                names: vec!["Intercept".into(), "x".into()],
                params: Array1::from(vec![-0.5, 1.25]),
                std_err: Array1::from(vec![0.1, 0.5]),
                z: Array1::from(vec![-5.0, 2.5]),
                p_values: Array1::from(vec![0.0000006, 0.0124]),
                conf_int: vec![(-0.7, -0.3), (0.27, 2.23)],
                llf: -10.0,
                llnull: -12.0,
                nobs: 20,
                iterations: 5,
                converged: true,
            },
            dropped: 3,
        }
    }

    #[test]
    fn csv_columns() {
        let dir = tempfile::tempdir().unwrap();
        let r = report();
        let path = dir.path().join(r.file_name());
        r.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("term,coef,std_err,z,p_value,ci_low,ci_high"));
        assert!(lines.next().unwrap().starts_with("Intercept,-0.5,0.1,-5"));
        assert!(path.ends_with("model_extreme_la.csv"));
    }

    #[test]
    fn table_has_every_term() {
        let out = report().format_table();
        assert!(out.contains("Intercept"));
        assert!(out.contains("1.2500"));
        assert!(out.contains("pseudo R2 = 0.1667"));
    }
}
