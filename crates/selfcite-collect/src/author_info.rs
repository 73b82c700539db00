//! Career columns for the first and last author of each journal result row.
//!
//! Reads `results_<journal><year>.csv`, looks up both authors from the
//! `Author(s) ID` column and writes `results_gendernames_<journal><year>.csv`
//! with the original columns plus:
//!
//! `fa_given_update, la_given_update, fa_start_date, fa_academic_age,
//! la_start_date, la_academic_age, fa_papers_before, la_papers_before`

use std::time::Instant;

use rustc_hash::FxHashMap;

use selfcite_core::{ProgressContext, is_shutdown_requested};
use selfcite_match::AuthorId;
use selfcite_scopus::{DocumentSummary, ScopusError, ScopusSource};

use crate::export::{COL_AUTHOR_IDS, ExportTable, parse_author_ids};
use crate::layout::JournalYear;
use crate::stats::RunStats;

pub const INFO_COLUMNS: [&str; 8] = [
    "fa_given_update",
    "la_given_update",
    "fa_start_date",
    "fa_academic_age",
    "la_start_date",
    "la_academic_age",
    "fa_papers_before",
    "la_papers_before",
];

const ERROR_CELL: &str = "Error";

/// What a row needs from one author, independent of the citing year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Career {
    pub given_name: Option<String>,
    pub start_year: i32,
    /// Cover-date year of every document
    pub pub_years: Vec<i32>,
}

impl Career {
    pub fn academic_age(&self, year: i32) -> i32 {
        year - self.start_year
    }

    pub fn papers_before(&self, year: i32) -> usize {
        self.pub_years.iter().filter(|&&y| y < year).count()
    }
}

/// Author lookups shared across rows and journal-years.
pub struct CareerCache<'a, S> {
    source: &'a S,
    memo: FxHashMap<AuthorId, Option<Career>>,
}

impl<'a, S: ScopusSource> CareerCache<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            memo: FxHashMap::default(),
        }
    }

    /// `None` when the profile, its publication range or its documents
    /// cannot be retrieved.
    pub fn get(&mut self, auid: AuthorId) -> Option<&Career> {
        let source = self.source;
        self.memo
            .entry(auid)
            .or_insert_with(|| match fetch_career(source, auid) {
                Ok(career) => Some(career),
                Err(e) => {
                    log::debug!("author {auid}: {e}");
                    None
                }
            })
            .as_ref()
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

fn fetch_career<S: ScopusSource>(source: &S, auid: AuthorId) -> Result<Career, ScopusError> {
    let profile = source.author(auid)?;
    let start_year = profile
        .start_year()
        .ok_or_else(|| ScopusError::NotFound(format!("author {auid}: no publication range")))?;
    let docs = source.author_documents(auid)?;
    Ok(Career {
        given_name: profile.given_name,
        start_year,
        pub_years: doc_years(&docs),
    })
}

fn doc_years(docs: &[DocumentSummary]) -> Vec<i32> {
    docs.iter().filter_map(|d| d.cover_date).map(|d| d.year()).collect()
}

/// The eight info cells for one row, `Error` and blanks when any lookup fails.
pub fn info_cells<S: ScopusSource>(cache: &mut CareerCache<'_, S>, author_ids: &str, year: i32) -> [String; 8] {
    let ids = parse_author_ids(author_ids);
    let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
        return error_cells();
    };
    let Some(fa) = cache.get(first).cloned() else {
        return error_cells();
    };
    let Some(la) = cache.get(last) else {
        return error_cells();
    };
    [
        fa.given_name.clone().unwrap_or_default(),
        la.given_name.clone().unwrap_or_default(),
        fa.start_year.to_string(),
        fa.academic_age(year).to_string(),
        la.start_year.to_string(),
        la.academic_age(year).to_string(),
        fa.papers_before(year).to_string(),
        la.papers_before(year).to_string(),
    ]
}

fn error_cells() -> [String; 8] {
    let mut cells: [String; 8] = Default::default();
    cells[0] = ERROR_CELL.to_string();
    cells[1] = ERROR_CELL.to_string();
    cells
}

/// Enrich every journal-year that has a results file.
pub fn run_author_info<S: ScopusSource>(
    source: &S,
    units: &[JournalYear],
    progress: &ProgressContext,
) -> anyhow::Result<RunStats> {
    let mut cache = CareerCache::new(source);
    let mut total = RunStats::default();
    for unit in units {
        let input = unit.results_path();
        if !input.exists() {
            log::warn!("{}: no results file {}, skipping", unit.stem(), input.display());
            continue;
        }
        let stats = run_unit(&mut cache, unit, progress)?;
        stats.log(&unit.stem());
        total.merge(&stats);
        if stats.interrupted {
            break;
        }
    }
    log::debug!("{} distinct authors looked up", cache.len());
    Ok(total)
}

fn run_unit<S: ScopusSource>(
    cache: &mut CareerCache<'_, S>,
    unit: &JournalYear,
    progress: &ProgressContext,
) -> anyhow::Result<RunStats> {
    let start = Instant::now();
    let mut table = ExportTable::read(&unit.results_path())?;
    let ids_col = table.require(COL_AUTHOR_IDS)?;
    let mut stats = RunStats::new(table.len());
    let bar = progress.record_bar(&unit.stem(), table.len() as u64);
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(table.len()); INFO_COLUMNS.len()];

    for row in 0..table.len() {
        if is_shutdown_requested() {
            log::warn!("Shutdown requested, writing {row} of {} rows", table.len());
            stats.interrupted = true;
            break;
        }
        let cells = info_cells(cache, table.get(row, ids_col).unwrap_or_default(), unit.year);
        if cells[0] == ERROR_CELL {
            stats.skipped += 1;
        } else {
            stats.processed += 1;
        }
        for (col, cell) in columns.iter_mut().zip(cells) {
            col.push(cell);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    table.truncate(columns[0].len());
    for (name, values) in INFO_COLUMNS.iter().zip(columns) {
        table.append_column(name, values)?;
    }
    let out = unit.gendernames_path();
    table.write(&out)?;
    log::info!("wrote {} rows to {}", table.len(), out.display());

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfcite_scopus::{AuthorProfile, CoverDate, Eid, MockSource};

    fn profile(auid: u64, given: &str, start: i32) -> AuthorProfile {
        AuthorProfile {
            auid: AuthorId(auid),
            surname: Some("Doe".into()),
            given_name: Some(given.into()),
            indexed_name: None,
            publication_range: Some((start, 2023)),
        }
    }

    fn docs(years: &[i32]) -> Vec<DocumentSummary> {
        years
            .iter()
            .enumerate()
            .map(|(i, y)| DocumentSummary::new(Eid::from_scopus_id(&i.to_string()), CoverDate::from_ymd(*y, 1, 1)))
            .collect()
    }

    fn source() -> MockSource {
        MockSource::new()
            .with_author(profile(1, "Stephanie", 2010))
            .with_documents(AuthorId(1), docs(&[2021, 2019, 2015]))
            .with_author(profile(2, "Dustin", 2000))
            .with_documents(AuthorId(2), docs(&[2020, 2001]))
    }

    #[test]
    fn first_and_last_author_columns() {
        let src = source();
        let mut cache = CareerCache::new(&src);
        let cells = info_cells(&mut cache, "1;9;2;", 2020);
        assert_eq!(cells, ["Stephanie", "Dustin", "2010", "10", "2000", "20", "2", "1"].map(String::from));
    }

    #[test]
    fn failed_lookup_marks_error() {
        let src = source();
        let mut cache = CareerCache::new(&src);
        let cells = info_cells(&mut cache, "1;404;", 2020);
        assert_eq!(cells[0], "Error");
        assert_eq!(cells[1], "Error");
        assert!(cells[2..].iter().all(String::is_empty));
        assert_eq!(info_cells(&mut cache, "", 2020)[0], "Error");
    }

    #[test]
    fn lookups_are_memoised() {
        let src = source();
        let mut cache = CareerCache::new(&src);
        info_cells(&mut cache, "1;2;", 2020);
        let calls = src.call_count();
        info_cells(&mut cache, "2;1;", 2021);
        assert_eq!(src.call_count(), calls);
        assert_eq!(cache.len(), 2);
    }
}
