//! Pair files in long format: one row per (pair, first or last author).
//!
//! This is the table the model stage fits. Author columns lose their
//! `_fa`/`_la` suffix and an `auth_type` column says which author the row is
//! about. Affiliation countries are mapped to continents and given names to
//! genders through an optional `name,gender` lookup file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::continent::continent_of;
use crate::pairs::{PairRow, read_pairs};

#[derive(Debug, Clone)]
pub struct ReshapeOptions {
    /// Directory holding the per-journal-year pair files
    pub input_dir: PathBuf,
    pub output: PathBuf,
    /// CSV with `name` and `gender` columns
    pub gender_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Fa,
    La,
}

/// One long-format row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub eid_citing: String,
    pub eid_cited: Option<String>,
    pub document_type: Option<String>,
    pub journal_citing: Option<String>,
    pub journal_cited: Option<String>,
    pub year_citing: Option<i32>,
    pub year_cited: Option<i32>,
    pub num_auth_citing: usize,
    pub num_auth_cited: Option<usize>,
    pub num_ref_citing: usize,
    pub field: String,
    pub auth_type: AuthType,
    pub sc: Option<u8>,
    pub sc_position: Option<usize>,
    pub auid: Option<u64>,
    pub given_name: Option<String>,
    pub academic_age: Option<i32>,
    pub num_prev_papers: Option<usize>,
    pub affil_country: Option<String>,
    pub affil_continent: Option<String>,
    pub gender: Option<String>,
}

/// Given-name to gender lookup.
#[derive(Debug, Default)]
pub struct GenderTable {
    genders: FxHashMap<String, String>,
}

impl GenderTable {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Entry {
            name: String,
            gender: String,
        }

        let mut reader =
            csv::Reader::from_path(path).with_context(|| format!("cannot open {}", path.display()))?;
        let mut genders = FxHashMap::default();
        for entry in reader.deserialize::<Entry>() {
            let entry = entry.with_context(|| format!("malformed gender file {}", path.display()))?;
            let gender = entry.gender.trim();
            if let Some(key) = name_key(&entry.name) {
                if !gender.is_empty() {
                    genders.insert(key, gender.to_lowercase());
                }
            }
        }
        log::debug!("{} names in {}", genders.len(), path.display());
        Ok(Self { genders })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let genders = pairs
            .into_iter()
            .filter_map(|(name, gender)| Some((name_key(name)?, gender.to_lowercase())))
            .collect();
        Self { genders }
    }

    /// Gender of the first given name, if listed.
    pub fn lookup(&self, given_name: &str) -> Option<&str> {
        self.genders.get(&name_key(given_name)?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.genders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genders.is_empty()
    }
}

/// First given name, transliterated and lowercased. Bare initials give `None`.
fn name_key(given: &str) -> Option<String> {
    let first = given
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|t| t.trim_matches('.'))
        .find(|t| !t.is_empty())?;
    let key = deunicode::deunicode(first).to_lowercase();
    (key.chars().count() > 1).then_some(key)
}

/// The two long rows of one pair row.
pub fn split_pair(pair: &PairRow, genders: &GenderTable) -> [LongRow; 2] {
    let row = |auth_type, sc, sc_position, auid, given: &Option<String>, age, prev, country: &Option<String>| LongRow {
        eid_citing: pair.eid_citing.clone(),
        eid_cited: pair.eid_cited.clone(),
        document_type: pair.document_type.clone(),
        journal_citing: pair.journal_citing.clone(),
        journal_cited: pair.journal_cited.clone(),
        year_citing: pair.year_citing,
        year_cited: pair.year_cited,
        num_auth_citing: pair.num_auth_citing,
        num_auth_cited: pair.num_auth_cited,
        num_ref_citing: pair.num_ref_citing,
        field: pair.field.clone(),
        auth_type,
        sc,
        sc_position,
        auid,
        given_name: given.clone(),
        academic_age: age,
        num_prev_papers: prev,
        affil_country: country.clone(),
        affil_continent: country
            .as_deref()
            .and_then(continent_of)
            .map(|c| c.as_str().to_string()),
        gender: given
            .as_deref()
            .and_then(|g| genders.lookup(g))
            .map(str::to_string),
    };
    [
        row(
            AuthType::Fa,
            pair.sc_fa,
            pair.position_fa_sc,
            pair.auid_fa,
            &pair.given_name_fa,
            pair.academic_age_fa,
            pair.num_prev_papers_fa,
            &pair.affil_country_fa,
        ),
        row(
            AuthType::La,
            pair.sc_la,
            pair.position_la_sc,
            pair.auid_la,
            &pair.given_name_la,
            pair.academic_age_la,
            pair.num_prev_papers_la,
            &pair.affil_country_la,
        ),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshapeReport {
    pub files: usize,
    pub pairs: usize,
    pub rows: usize,
    pub unknown_continent: usize,
    pub unknown_gender: usize,
}

/// Reshape every `*.csv` in the input directory into one long table.
pub fn run_reshape(options: &ReshapeOptions) -> anyhow::Result<ReshapeReport> {
    let genders = match &options.gender_csv {
        Some(path) => GenderTable::read(path)?,
        None => GenderTable::default(),
    };

    let pattern = options.input_dir.join("*.csv");
    let mut inputs = glob::glob(&pattern.to_string_lossy())
        .context("invalid glob pattern")?
        .collect::<Result<Vec<_>, _>>()?;
    inputs.retain(|p| p != &options.output);
    inputs.sort();
    anyhow::ensure!(!inputs.is_empty(), "no pair files in {}", options.input_dir.display());

    if let Some(parent) = options.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(&options.output)
        .with_context(|| format!("cannot create {}", options.output.display()))?;
    let mut report = ReshapeReport::default();
    for path in &inputs {
        let pairs = read_pairs(path)?;
        log::debug!("{}: {} pairs", path.display(), pairs.len());
        report.files += 1;
        report.pairs += pairs.len();
        for pair in &pairs {
            for row in split_pair(pair, &genders) {
                report.unknown_continent += usize::from(row.affil_continent.is_none());
                report.unknown_gender += usize::from(row.gender.is_none());
                writer.serialize(&row)?;
                report.rows += 1;
            }
        }
    }
    writer.flush()?;
    log::info!(
        "wrote {} rows from {} pairs in {} files to {}",
        report.rows,
        report.pairs,
        report.files,
        options.output.display()
    );
    Ok(report)
}
