//! Model-stage errors

use std::path::PathBuf;

#[derive(Debug)]
pub enum ModelError {
    /// Input table could not be read
    Read { path: PathBuf, source: csv::Error },
    /// Report could not be written
    Write { path: PathBuf, source: csv::Error },
    MissingColumn(String),
    /// A numeric column was required
    NotNumeric(String),
    /// Formula text could not be parsed or does not fit the data
    Formula(String),
    /// Response values outside {0, 1}
    Response(String),
    /// Fewer usable rows than coefficients
    TooFewRows { rows: usize, columns: usize },
    /// Hessian not positive definite (collinear design or separation)
    Singular,
    /// Columns of unequal length
    Shape(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Write { path, source } => write!(f, "cannot write {}: {source}", path.display()),
            Self::MissingColumn(name) => write!(f, "missing column {name:?}"),
            Self::NotNumeric(name) => write!(f, "column {name:?} is not numeric"),
            Self::Formula(msg) => write!(f, "formula: {msg}"),
            Self::Response(msg) => write!(f, "response: {msg}"),
            Self::TooFewRows { rows, columns } => {
                write!(f, "{rows} usable rows for {columns} coefficients")
            }
            Self::Singular => f.write_str("information matrix is singular"),
            Self::Shape(msg) => write!(f, "shape: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ModelError {
    /// Problem with the input data or formula rather than the fit itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::MissingColumn(_) | Self::NotNumeric(_) | Self::Formula(_) | Self::Response(_)
        )
    }
}
