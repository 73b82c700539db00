//! Scopus CSV exports and the CSV tables the pipelines pass along.
//!
//! The journal and author-info stages keep every input column and append
//! their own, so rows are held as raw string records.

use std::path::Path;

use anyhow::Context;
use csv::StringRecord;

use selfcite_match::AuthorId;
use selfcite_scopus::Eid;

/// Author string Scopus writes for records without authors.
pub const NO_AUTHOR: &str = "[No author name available]";

pub const COL_EID: &str = "EID";
pub const COL_AUTHORS: &str = "Authors";
pub const COL_AUTHOR_IDS: &str = "Author(s) ID";
pub const COL_DOCUMENT_TYPE: &str = "Document Type";

/// A CSV table with named columns.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl ExportTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: StringRecord::from(headers.to_vec()),
            rows: Vec::new(),
        }
    }

    /// Read any CSV with a header row.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("cannot read header of {}", path.display()))?
            .clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("malformed CSV {}", path.display()))?;
        Ok(Self { headers, rows })
    }

    /// Read a Scopus export, dropping records without authors.
    pub fn read_export(path: &Path) -> anyhow::Result<Self> {
        let mut table = Self::read(path)?;
        let before = table.rows.len();
        if let Some(col) = table.column(COL_AUTHORS) {
            table
                .rows
                .retain(|r| r.get(col).map(str::trim) != Some(NO_AUTHOR));
        }
        let dropped = before - table.rows.len();
        if dropped > 0 {
            log::debug!("{}: dropped {dropped} records without authors", path.display());
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim_start_matches('\u{feff}') == name)
    }

    /// Like [`Self::column`], but a missing column is an error.
    pub fn require(&self, name: &str) -> anyhow::Result<usize> {
        self.column(name)
            .with_context(|| format!("missing column {name:?}"))
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).filter(|s| !s.is_empty())
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Keep only the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    pub fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = StringRecord::new();
        for v in values {
            record.push_field(v.as_ref());
        }
        self.rows.push(record);
    }

    /// Add a column; `values` must have one entry per row.
    pub fn append_column(&mut self, name: &str, values: Vec<String>) -> anyhow::Result<()> {
        anyhow::ensure!(
            values.len() == self.rows.len(),
            "column {name}: {} values for {} rows",
            values.len(),
            self.rows.len()
        );
        self.headers.push_field(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push_field(&value);
        }
        Ok(())
    }

    /// EID of every row, `None` where the cell does not parse.
    pub fn eids(&self) -> anyhow::Result<Vec<Option<Eid>>> {
        let col = self.require(COL_EID)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(col).and_then(Eid::parse))
            .collect())
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Parse an `Author(s) ID` cell (`"57193845123;7004061738;"`).
pub fn parse_author_ids(cell: &str) -> Vec<AuthorId> {
    cell.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
