//! Column-oriented table read from CSV.
//!
//! A column is numeric when every non-empty cell parses as a number,
//! otherwise text. Empty cells and `NaN` are missing values.

use std::path::Path;

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Numeric(v) => !matches!(v.get(row), Some(Some(_))),
            Self::Text(v) => !matches!(v.get(row), Some(Some(_))),
        }
    }

    /// Cell as text; numbers use their shortest display form.
    pub fn text_at(&self, row: usize) -> Option<String> {
        match self {
            Self::Numeric(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            Self::Text(v) => v.get(row).cloned().flatten(),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    fn from_cells(cells: Vec<String>) -> Self {
        let cells: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| {
                let c = c.trim();
                (!c.is_empty() && !c.eq_ignore_ascii_case("nan")).then(|| c.to_string())
            })
            .collect();
        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|c| match c {
                Some(s) => s.parse::<f64>().ok().map(Some),
                None => Some(None),
            })
            .collect();
        match parsed {
            Some(values) => Self::Numeric(values),
            None => Self::Text(cells),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    len: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_csv(path: &Path) -> Result<Self, ModelError> {
        let read_err = |source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
        let names: Vec<String> = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            for (col, cell) in cells.iter_mut().zip(record.iter()) {
                col.push(cell.to_string());
            }
        }
        let len = cells.first().map_or(0, Vec::len);
        let columns = cells.into_iter().map(Column::from_cells).collect();
        log::debug!("{}: {len} rows, {} columns", path.display(), names.len());
        Ok(Self { names, columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, ModelError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| ModelError::MissingColumn(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], ModelError> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Text(_) => Err(ModelError::NotNumeric(name.to_string())),
        }
    }

    /// Text view of any column.
    pub fn text(&self, name: &str) -> Result<Vec<Option<String>>, ModelError> {
        let column = self.column(name)?;
        Ok((0..self.len).map(|row| column.text_at(row)).collect())
    }

    /// Add or replace a column.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<(), ModelError> {
        if !self.names.is_empty() && column.len() != self.len {
            return Err(ModelError::Shape(format!(
                "column {name}: {} values for {} rows",
                column.len(),
                self.len
            )));
        }
        self.len = column.len();
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            self.names.remove(i);
            self.columns.remove(i);
        }
    }

    /// Apply `f` to every present value of a numeric column.
    pub fn map_numeric(&mut self, name: &str, f: impl Fn(f64) -> f64) -> Result<(), ModelError> {
        let values: Vec<Option<f64>> = self.numeric(name)?.iter().map(|v| v.map(&f)).collect();
        self.set_column(name, Column::Numeric(values))
    }

    /// Keep the rows where `mask` is true.
    pub fn retain(&mut self, mask: &[bool]) {
        let rows: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        *self = self.take(&rows);
    }

    /// New frame with the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            len: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "sc,auth_type,age\n1,fa,3.5\n0,la,\nNaN,fa,7\n").unwrap();
        Frame::read_csv(&path).unwrap()
    }

    #[test]
    fn infers_column_kinds() {
        let f = frame();
        assert_eq!(f.len(), 3);
        assert_eq!(f.numeric("sc").unwrap(), &[Some(1.0), Some(0.0), None]);
        assert_eq!(f.numeric("age").unwrap(), &[Some(3.5), None, Some(7.0)]);
        assert!(matches!(f.numeric("auth_type"), Err(ModelError::NotNumeric(_))));
        assert!(matches!(f.column("nope"), Err(ModelError::MissingColumn(_))));
    }

    #[test]
    fn text_view_of_numbers() {
        let f = frame();
        assert_eq!(f.text("sc").unwrap()[0].as_deref(), Some("1"));
        assert_eq!(f.text("auth_type").unwrap()[1].as_deref(), Some("la"));
    }

    #[test]
    fn retain_and_map() {
        let mut f = frame();
        f.retain(&[true, false, true]);
        f.map_numeric("age", |x| x * 2.0).unwrap();
        assert_eq!(f.numeric("age").unwrap(), &[Some(7.0), Some(14.0)]);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn set_column_checks_length() {
        let mut f = frame();
        assert!(f.set_column("x", Column::Numeric(vec![Some(1.0)])).is_err());
        f.set_column("x", Column::Numeric(vec![None; 3])).unwrap();
        f.drop_column("sc");
        assert_eq!(f.names(), &["auth_type", "age", "x"]);
    }
}
