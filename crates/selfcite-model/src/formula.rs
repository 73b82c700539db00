//! Model formulas and design matrices.
//!
//! Supported syntax, a subset of the usual R/patsy notation:
//!
//! ```text
//! y ~ a + b + C(x) + C(x, Treatment(reference="Asia")) + a:b
//! ```
//!
//! Text columns are categorical and get treatment coding against their first
//! level in sorted order unless a reference is given. `C(..)` forces a numeric
//! column to be categorical. `a:b` multiplies the encodings of its factors.
//! An intercept is always included unless the formula contains a `0` term.
//! Rows with a missing value in any used column are dropped.

use std::sync::LazyLock;

use ndarray::{Array1, Array2};
use regex::Regex;

use crate::error::ModelError;
use crate::frame::{Column, Frame};

pub const INTERCEPT: &str = "Intercept";

static CATEGORICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^C\(\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(?:,\s*Treatment\(\s*(?:reference\s*=\s*)?["']([^"']*)["']\s*\)\s*)?\)$"#,
    )
    .expect("valid regex")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    pub column: String,
    /// Written as `C(..)`
    pub categorical: bool,
    pub reference: Option<String>,
    /// Factor as written, used in coefficient names
    pub label: String,
}

impl Factor {
    fn parse(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if let Some(caps) = CATEGORICAL_RE.captures(text) {
            return Ok(Self {
                column: caps[1].to_string(),
                categorical: true,
                reference: caps.get(2).map(|m| m.as_str().to_string()),
                label: text.to_string(),
            });
        }
        if NAME_RE.is_match(text) {
            return Ok(Self {
                column: text.to_string(),
                categorical: false,
                reference: None,
                label: text.to_string(),
            });
        }
        Err(ModelError::Formula(format!("cannot parse term {text:?}")))
    }
}

/// One `+`-separated term: a single factor or an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub factors: Vec<Factor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub response: String,
    pub terms: Vec<Term>,
    pub intercept: bool,
}

/// Split on `sep` outside parentheses and quotes.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut depth, mut quote, mut start) = (0i32, None, 0);
    for (i, ch) in text.char_indices() {
        match (ch, quote) {
            ('"' | '\'', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            (_, Some(_)) => {}
            ('(', None) => depth += 1,
            (')', None) => depth -= 1,
            (c, None) if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

impl Formula {
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let (lhs, rhs) = text
            .split_once('~')
            .ok_or_else(|| ModelError::Formula(format!("no '~' in {text:?}")))?;
        let response = lhs.trim();
        if !NAME_RE.is_match(response) {
            return Err(ModelError::Formula(format!("bad response {response:?}")));
        }

        let mut terms: Vec<Term> = Vec::new();
        let mut intercept = true;
        for part in split_top_level(rhs, '+').into_iter().map(str::trim) {
            match part {
                "" | "1" => continue,
                "0" => {
                    intercept = false;
                    continue;
                }
                _ => {}
            }
            let factors = split_top_level(part, ':')
                .into_iter()
                .map(Factor::parse)
                .collect::<Result<Vec<_>, _>>()?;
            let term = Term { factors };
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        if terms.is_empty() && !intercept {
            return Err(ModelError::Formula("no terms".into()));
        }
        Ok(Self {
            response: response.to_string(),
            terms,
            intercept,
        })
    }

    /// Every column the formula reads, response first.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![self.response.as_str()];
        for factor in self.terms.iter().flat_map(|t| &t.factors) {
            if !cols.contains(&factor.column.as_str()) {
                cols.push(&factor.column);
            }
        }
        cols
    }
}

/// Response vector and design matrix with named columns.
#[derive(Debug, Clone)]
pub struct Design {
    pub response: String,
    pub names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// Rows dropped for missing values
    pub dropped: usize,
}

impl Design {
    pub fn nobs(&self) -> usize {
        self.y.len()
    }
}

/// Encoded columns of one factor over the kept rows.
struct Encoded {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    numeric: bool,
}

fn encode(frame: &Frame, factor: &Factor, rows: &[usize]) -> Result<Encoded, ModelError> {
    let column = frame.column(&factor.column)?;
    if let (Column::Numeric(values), false) = (column, factor.categorical) {
        return Ok(Encoded {
            names: vec![factor.label.clone()],
            columns: vec![rows.iter().map(|&r| values[r].unwrap_or(f64::NAN)).collect()],
            numeric: true,
        });
    }

    let cells: Vec<String> = rows
        .iter()
        .map(|&r| column.text_at(r).unwrap_or_default())
        .collect();
    let mut levels: Vec<String> = cells.clone();
    match column {
        Column::Numeric(_) => levels.sort_by(|a, b| {
            let (a, b) = (a.parse::<f64>().unwrap_or(f64::NAN), b.parse::<f64>().unwrap_or(f64::NAN));
            a.total_cmp(&b)
        }),
        Column::Text(_) => levels.sort(),
    }
    levels.dedup();

    let reference = match &factor.reference {
        Some(r) if levels.contains(r) => r.clone(),
        Some(r) => {
            return Err(ModelError::Formula(format!(
                "reference {r:?} is not a level of {}",
                factor.column
            )));
        }
        None => levels
            .first()
            .cloned()
            .ok_or_else(|| ModelError::Formula(format!("{} has no levels", factor.column)))?,
    };

    let (names, columns) = levels
        .iter()
        .filter(|l| **l != reference)
        .map(|level| {
            let name = format!("{}[T.{level}]", factor.label);
            let column: Vec<f64> = cells.iter().map(|c| f64::from(u8::from(c == level))).collect();
            (name, column)
        })
        .unzip();
    Ok(Encoded {
        names,
        columns,
        numeric: false,
    })
}

/// Column-wise product of the factor encodings of one term.
fn interact(parts: Vec<Encoded>, n: usize) -> (Vec<String>, Vec<Vec<f64>>) {
    let mut names = vec![String::new()];
    let mut columns = vec![vec![1.0; n]];
    for part in parts {
        let mut next_names = Vec::with_capacity(names.len() * part.names.len());
        let mut next_columns = Vec::with_capacity(next_names.capacity());
        for (name, column) in names.iter().zip(&columns) {
            for (pname, pcol) in part.names.iter().zip(&part.columns) {
                next_names.push(if name.is_empty() {
                    pname.clone()
                } else {
                    format!("{name}:{pname}")
                });
                next_columns.push(column.iter().zip(pcol).map(|(a, b)| a * b).collect());
            }
        }
        names = next_names;
        columns = next_columns;
    }
    (names, columns)
}

impl Formula {
    /// Build the design matrix from `frame`.
    ///
    /// Terms made only of categorical factors come first, then terms with a
    /// numeric factor, each group in formula order.
    pub fn design(&self, frame: &Frame) -> Result<Design, ModelError> {
        let used = self.columns();
        let columns = used
            .iter()
            .map(|name| frame.column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let rows: Vec<usize> = (0..frame.len())
            .filter(|&r| columns.iter().all(|c| !c.is_missing(r)))
            .collect();
        let dropped = frame.len() - rows.len();
        let n = rows.len();

        let response = frame.numeric(&self.response)?;
        let y: Array1<f64> = rows.iter().map(|&r| response[r].unwrap_or(f64::NAN)).collect();
        if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
            return Err(ModelError::Response(format!("{} has value {bad}", self.response)));
        }

        let mut categorical = Vec::new();
        let mut numeric = Vec::new();
        for term in &self.terms {
            let parts = term
                .factors
                .iter()
                .map(|f| encode(frame, f, &rows))
                .collect::<Result<Vec<_>, _>>()?;
            let has_numeric = parts.iter().any(|p| p.numeric);
            let encoded = interact(parts, n);
            if has_numeric {
                numeric.push(encoded);
            } else {
                categorical.push(encoded);
            }
        }

        let mut names = Vec::new();
        let mut data: Vec<Vec<f64>> = Vec::new();
        if self.intercept {
            names.push(INTERCEPT.to_string());
            data.push(vec![1.0; n]);
        }
        for (term_names, term_columns) in categorical.into_iter().chain(numeric) {
            names.extend(term_names);
            data.extend(term_columns);
        }

        let k = names.len();
        if n <= k {
            return Err(ModelError::TooFewRows { rows: n, columns: k });
        }
        let x = Array2::from_shape_fn((n, k), |(i, j)| data[j][i]);
        log::debug!("design {n} x {k}, {dropped} rows dropped for missing values");
        Ok(Design {
            response: self.response.clone(),
            names,
            x,
            y,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        let mut f = Frame::new();
        let num = |v: &[Option<f64>]| Column::Numeric(v.to_vec());
        let text = |v: &[&str]| Column::Text(v.iter().map(|s| Some(s.to_string())).collect());
        let one = Some(1.0);
        let zero = Some(0.0);
        f.set_column("sc", num(&[one, zero, one, zero, one, zero, one, zero])).unwrap();
        f.set_column(
            "age",
            num(&[Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0), Some(7.0), Some(8.0)]),
        )
        .unwrap();
        f.set_column("auth_type", text(&["la", "fa", "la", "fa", "fa", "la", "fa", "la"])).unwrap();
        f.set_column(
            "continent",
            text(&["Europe", "Asia", "Africa", "Asia", "Asia", "Europe", "Africa", "Asia"]),
        )
        .unwrap();
        f
    }

    #[test]
    fn parses_terms() {
        let f = Formula::parse(r#"sc ~ age +  + C(continent, Treatment(reference="Asia")) + age:auth_type"#).unwrap();
        assert_eq!(f.response, "sc");
        assert_eq!(f.terms.len(), 3);
        assert_eq!(f.terms[1].factors[0].reference.as_deref(), Some("Asia"));
        assert_eq!(f.terms[2].factors.len(), 2);
        assert_eq!(f.columns(), vec!["sc", "age", "continent", "auth_type"]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Formula::parse("sc age").is_err());
        assert!(Formula::parse("sc ~ log(age)").is_err());
        assert!(Formula::parse("sc ~ 0").is_err());
    }

    #[test]
    fn treatment_coding_and_order() {
        let formula = Formula::parse(r#"sc ~ age + C(continent, Treatment(reference="Asia")) + auth_type"#).unwrap();
        let design = formula.design(&frame()).unwrap();
        assert_eq!(
            design.names,
            vec![
                "Intercept",
                r#"C(continent, Treatment(reference="Asia"))[T.Africa]"#,
                r#"C(continent, Treatment(reference="Asia"))[T.Europe]"#,
                "auth_type[T.la]",
                "age",
            ]
        );
        // Row 3 has no age
        assert_eq!(design.dropped, 1);
        assert_eq!(design.nobs(), 7);
        assert_eq!(design.x.row(0).to_vec(), vec![1.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(design.x.row(2).to_vec(), vec![1.0, 1.0, 0.0, 1.0, 3.0]);
    }

    #[test]
    fn interaction_names_and_values() {
        let formula = Formula::parse("sc ~ auth_type + age:auth_type").unwrap();
        let design = formula.design(&frame()).unwrap();
        assert_eq!(design.names, vec!["Intercept", "auth_type[T.la]", "age:auth_type[T.la]"]);
        assert_eq!(design.x.column(2).to_vec(), vec![1.0, 0.0, 3.0, 0.0, 6.0, 0.0, 8.0]);
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let formula = Formula::parse(r#"sc ~ C(continent, Treatment(reference="Oceania"))"#).unwrap();
        assert!(matches!(formula.design(&frame()), Err(ModelError::Formula(_))));
    }

    #[test]
    fn response_must_be_binary() {
        let formula = Formula::parse("age ~ auth_type").unwrap();
        assert!(matches!(formula.design(&frame()), Err(ModelError::Response(_))));
    }
}
