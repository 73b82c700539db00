//! Directory layout of journal-year exports.
//!
//! ```text
//! <base>/All_<field>/<journal>/<journal><year>.csv
//! <base>/All_<field>/<journal>/<journal><year>_ref.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;

/// One journal-year unit of work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JournalYear {
    pub field: String,
    pub journal: String,
    pub year: i32,
    /// Directory holding the journal's exports
    pub dir: PathBuf,
}

impl JournalYear {
    pub fn new(field: &str, journal: &str, year: i32, dir: impl Into<PathBuf>) -> Self {
        Self {
            field: field.to_string(),
            journal: journal.to_string(),
            year,
            dir: dir.into(),
        }
    }

    /// `<journal><year>`, the stem every file of this unit shares.
    pub fn stem(&self) -> String {
        format!("{}{}", self.journal, self.year)
    }

    pub fn articles_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.stem()))
    }

    pub fn refs_path(&self) -> PathBuf {
        self.dir.join(format!("{}_ref.csv", self.stem()))
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(format!("results_{}.csv", self.stem()))
    }

    pub fn gendernames_path(&self) -> PathBuf {
        self.dir.join(format!("results_gendernames_{}.csv", self.stem()))
    }

    /// Pair-dataset output for this unit under `out_dir`.
    pub fn pairs_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(format!("{}.csv", self.stem()))
    }
}

/// Find every journal-year with a reference export under `base`.
///
/// `years` restricts the result when non-empty. Sorted by field, journal, year.
pub fn discover(base: &Path, fields: &[String], years: &[i32]) -> anyhow::Result<Vec<JournalYear>> {
    let mut found = Vec::new();
    for field in fields {
        let field_dir = base.join(format!("All_{field}"));
        if !field_dir.is_dir() {
            log::warn!("no directory {}", field_dir.display());
            continue;
        }
        for entry in std::fs::read_dir(&field_dir)
            .with_context(|| format!("cannot list {}", field_dir.display()))?
        {
            let dir = entry?.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(journal) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            for year in ref_years(&dir, &journal)? {
                if years.is_empty() || years.contains(&year) {
                    found.push(JournalYear::new(field, &journal, year, &dir));
                }
            }
        }
    }
    found.sort();
    log::debug!("discovered {} journal-years under {}", found.len(), base.display());
    Ok(found)
}

/// Years for which `<journal><year>_ref.csv` exists in `dir`.
fn ref_years(dir: &Path, journal: &str) -> anyhow::Result<Vec<i32>> {
    let pattern = dir.join("*_ref.csv");
    let pattern = pattern.to_string_lossy();
    let year_re = Regex::new(&format!(r"^{}(\d{{4}})_ref\.csv$", regex::escape(journal)))?;
    let mut years = Vec::new();
    for path in glob::glob(&pattern).context("invalid glob pattern")? {
        let path = path?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(year) = year_re
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
        {
            years.push(year);
        }
    }
    years.sort_unstable();
    Ok(years)
}

/// Parse `"2016,2017"` or `"2016-2020"` into a year list.
pub fn parse_years(text: &str) -> anyhow::Result<Vec<i32>> {
    let mut years = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((a, b)) => {
                let (a, b): (i32, i32) = (
                    a.trim().parse().with_context(|| format!("bad year {a:?}"))?,
                    b.trim().parse().with_context(|| format!("bad year {b:?}"))?,
                );
                anyhow::ensure!(a <= b, "empty year range {part}");
                years.extend(a..=b);
            }
            None => years.push(part.parse().with_context(|| format!("bad year {part:?}"))?),
        }
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn discovers_journal_years() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("All_Neuro/Neuron/Neuron2019_ref.csv"));
        touch(&base.join("All_Neuro/Neuron/Neuron2020_ref.csv"));
        touch(&base.join("All_Neuro/Neuron/Neuron2020.csv"));
        touch(&base.join("All_Neuro/Brain/Brain2020_ref.csv"));
        touch(&base.join("All_Psychiatry/Mol Psych/Mol Psych2018_ref.csv"));

        let all = discover(base, &["Neuro".into(), "Psychiatry".into()], &[]).unwrap();
        let names: Vec<String> = all.iter().map(JournalYear::stem).collect();
        assert_eq!(names, vec!["Brain2020", "Neuron2019", "Neuron2020", "Mol Psych2018"]);
        assert_eq!(all[0].field, "Neuro");

        let only = discover(base, &["Neuro".into()], &[2020]).unwrap();
        assert_eq!(only.len(), 2);
    }

    #[test]
    fn journal_names_are_literal_in_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("J.Neuro2020_ref.csv"));
        touch(&dir.path().join("JxNeuro2021_ref.csv"));
        assert_eq!(ref_years(dir.path(), "J.Neuro").unwrap(), vec![2020]);
    }

    #[test]
    fn missing_field_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), &["Nope".into()], &[]).unwrap().is_empty());
    }

    #[test]
    fn paths() {
        let jy = JournalYear::new("Neuro", "Neuron", 2020, "/d");
        assert_eq!(jy.results_path(), PathBuf::from("/d/results_Neuron2020.csv"));
        assert_eq!(jy.gendernames_path(), PathBuf::from("/d/results_gendernames_Neuron2020.csv"));
        assert_eq!(jy.pairs_path(Path::new("/o")), PathBuf::from("/o/Neuron2020.csv"));
    }

    #[test]
    fn year_lists_and_ranges() {
        assert_eq!(parse_years("2016-2018, 2020").unwrap(), vec![2016, 2017, 2018, 2020]);
        assert!(parse_years("2020-2016").is_err());
        assert!(parse_years("twenty").is_err());
    }
}
