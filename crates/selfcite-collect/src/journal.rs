//! Article-level self-citation counts for one journal-year export.
//!
//! Two passes per article:
//!
//! 1. a string pre-filter: citing initials (from the export's `Authors`)
//!    against each reference's export author string (`*_str` columns),
//!    selecting candidate references;
//! 2. candidates are retrieved and matched on author IDs and full names,
//!    falling back to initials when the cited record has neither.

use std::fmt;
use std::time::Instant;

use anyhow::Context;
use rustc_hash::FxHashMap;

use selfcite_core::{ProgressContext, is_shutdown_requested};
use selfcite_match::{
    CitedAuthors, CitingAuthors, MatchPolicy, SelfCitation, classify, clean_author_list,
};
use selfcite_scopus::{Eid, ScopusError, ScopusSource};

use crate::export::{COL_AUTHORS, COL_EID, ExportTable};
use crate::layout::JournalYear;
use crate::resolve::resolve_eid;
use crate::stats::RunStats;

/// A count cell: a number, or why there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Count(usize),
    /// Citing article has no author IDs
    NoIds,
    /// Citing article could not be processed
    Error,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::NoIds => f.write_str("No IDs"),
            Self::Error => f.write_str("Error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JournalOptions {
    /// Skip journal-years whose results file exists
    pub skip_existing: bool,
}

/// First/last/either/any counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub fa: usize,
    pub la: usize,
    pub fa_la: usize,
    pub any: usize,
}

impl Counts {
    fn add(&mut self, sc: &SelfCitation) {
        self.fa += usize::from(sc.first_author());
        self.la += usize::from(sc.last_author());
        self.fa_la += usize::from(sc.first_or_last());
        self.any += usize::from(sc.any());
    }
}

/// EIDs of matching references per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedEids {
    pub fa: Vec<Eid>,
    pub la: Vec<Eid>,
    pub fa_la: Vec<Eid>,
    pub any: Vec<Eid>,
}

impl MatchedEids {
    fn add(&mut self, eid: &Eid, sc: &SelfCitation) {
        let lists = [
            (&mut self.fa, sc.first_author()),
            (&mut self.la, sc.last_author()),
            (&mut self.fa_la, sc.first_or_last()),
            (&mut self.any, sc.any()),
        ];
        for (list, hit) in lists {
            if hit {
                list.push(eid.clone());
            }
        }
    }
}

/// Result for one citing article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Scored {
        numref: usize,
        by_string: Counts,
        by_id: Counts,
        eids: MatchedEids,
    },
    NoIds {
        numref: usize,
        by_string: Counts,
    },
    Error,
}

/// Output columns appended to the export, in order.
pub const RESULT_COLUMNS: [&str; 13] = [
    "numref", "fa", "la", "fa_la", "any", "fa_str", "la_str", "fa_la_str", "any_str", "fa_EIDs",
    "la_EIDs", "fa_la_EIDs", "any_EIDs",
];

impl ArticleOutcome {
    /// Cell values for [`RESULT_COLUMNS`].
    pub fn cells(&self) -> [String; 13] {
        let counts = |c: &Counts| [c.fa, c.la, c.fa_la, c.any].map(|n| Tally::Count(n).to_string());
        match self {
            Self::Scored {
                numref,
                by_string,
                by_id,
                eids,
            } => {
                let [fa, la, fa_la, any] = counts(by_id);
                let [fa_s, la_s, fa_la_s, any_s] = counts(by_string);
                [
                    numref.to_string(),
                    fa,
                    la,
                    fa_la,
                    any,
                    fa_s,
                    la_s,
                    fa_la_s,
                    any_s,
                    join_eids(&eids.fa),
                    join_eids(&eids.la),
                    join_eids(&eids.fa_la),
                    join_eids(&eids.any),
                ]
            }
            Self::NoIds { numref, by_string } => {
                let no = Tally::NoIds.to_string();
                let [fa_s, la_s, fa_la_s, any_s] = counts(by_string);
                [
                    numref.to_string(),
                    no.clone(),
                    no.clone(),
                    no.clone(),
                    no.clone(),
                    fa_s,
                    la_s,
                    fa_la_s,
                    any_s,
                    no.clone(),
                    no.clone(),
                    no.clone(),
                    no,
                ]
            }
            Self::Error => std::array::from_fn(|_| Tally::Error.to_string()),
        }
    }
}

fn join_eids(eids: &[Eid]) -> String {
    eids.iter().map(Eid::as_str).collect::<Vec<_>>().join(";")
}

/// Reference export indexed by EID: the printed author string of each record.
pub struct RefIndex {
    authors: FxHashMap<Eid, String>,
}

impl RefIndex {
    pub fn from_table(table: &ExportTable) -> anyhow::Result<Self> {
        let eid_col = table.require(COL_EID)?;
        let authors_col = table.require(COL_AUTHORS)?;
        let authors = table
            .rows()
            .iter()
            .filter_map(|r| {
                let eid = r.get(eid_col).and_then(Eid::parse)?;
                Some((eid, r.get(authors_col).unwrap_or_default().to_string()))
            })
            .collect();
        Ok(Self { authors })
    }

    pub fn get(&self, eid: &Eid) -> Option<&str> {
        self.authors.get(eid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// Score one citing article.
pub fn score_article<S: ScopusSource>(
    source: &S,
    eid: &Eid,
    export_authors: &str,
    refs: &RefIndex,
    stats: &mut RunStats,
) -> Result<ArticleOutcome, ScopusError> {
    let citing_initials = CitingAuthors::from_initials(clean_author_list(export_authors));
    if citing_initials.is_empty() {
        return Err(ScopusError::NotFound(format!("{eid}: no parsable authors")));
    }

    let record = source.abstract_full(eid)?;
    let references = record
        .references
        .as_ref()
        .ok_or_else(|| ScopusError::NotFound(format!("{eid}: no bibliography")))?;
    let ref_eids: Vec<Eid> = references.iter().filter_map(|r| r.eid()).collect();
    let numref = ref_eids.len();

    // Pass 1: export strings
    let mut by_string = Counts::default();
    let mut candidates = Vec::new();
    for ref_eid in &ref_eids {
        let Some(raw) = refs.get(ref_eid) else {
            continue;
        };
        let sc = classify(&citing_initials, &CitedAuthors::from_raw_authors(raw), MatchPolicy::permissive());
        if sc.any() {
            by_string.add(&sc);
            candidates.push((ref_eid, raw));
        }
    }

    if record.author_ids().is_empty() {
        return Ok(ArticleOutcome::NoIds { numref, by_string });
    }

    // Pass 2: retrieved candidates. First and last are the outermost authors with IDs
    let citing: CitingAuthors = record
        .citing_authors()
        .iter()
        .filter(|a| a.id.is_some())
        .cloned()
        .collect();
    let mut by_id = Counts::default();
    let mut eids = MatchedEids::default();
    for (ref_eid, raw) in candidates {
        let resolved = resolve_eid(source, ref_eid, Some(raw));
        stats.record_resolution(resolved.resolution);
        let sc = if resolved.resolution.is_structured() {
            classify(&citing, &resolved.cited, MatchPolicy::default())
        } else {
            classify(&citing_initials, &resolved.cited, MatchPolicy::permissive())
        };
        by_id.add(&sc);
        eids.add(ref_eid, &sc);
        if sc.any() {
            stats.self_citations += 1;
        }
    }

    Ok(ArticleOutcome::Scored {
        numref,
        by_string,
        by_id,
        eids,
    })
}

/// Run one journal-year and write `results_<journal><year>.csv`.
pub fn run_journal<S: ScopusSource>(
    source: &S,
    unit: &JournalYear,
    options: JournalOptions,
    progress: &ProgressContext,
) -> anyhow::Result<RunStats> {
    let out = unit.results_path();
    if options.skip_existing && out.exists() {
        log::info!("{}: results exist, skipping", unit.stem());
        return Ok(RunStats::default());
    }

    let start = Instant::now();
    let mut articles = ExportTable::read_export(&unit.articles_path())?;
    let refs = RefIndex::from_table(&ExportTable::read(&unit.refs_path())?)
        .with_context(|| format!("reference export {}", unit.refs_path().display()))?;
    let authors_col = articles.require(COL_AUTHORS)?;
    let eids = articles.eids()?;
    log::info!(
        "{}: {} articles, {} exported references",
        unit.stem(),
        articles.len(),
        refs.len()
    );

    let mut stats = RunStats::new(articles.len());
    let bar = progress.record_bar(&unit.stem(), articles.len() as u64);
    let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(articles.len()); RESULT_COLUMNS.len()];

    for (row, eid) in eids.iter().enumerate() {
        if is_shutdown_requested() {
            log::warn!("Shutdown requested, writing {row} of {} articles", articles.len());
            stats.interrupted = true;
            break;
        }
        let outcome = match eid {
            Some(eid) => {
                let authors = articles.get(row, authors_col).unwrap_or_default();
                match score_article(source, eid, authors, &refs, &mut stats) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        log::warn!("{eid}: {e}");
                        ArticleOutcome::Error
                    }
                }
            }
            None => {
                log::warn!("{}: row {row} has no valid EID", unit.stem());
                ArticleOutcome::Error
            }
        };
        if matches!(outcome, ArticleOutcome::Error) {
            stats.skipped += 1;
        } else {
            stats.processed += 1;
        }
        for (col, cell) in columns.iter_mut().zip(outcome.cells()) {
            col.push(cell);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let done = columns[0].len();
    articles.truncate(done);
    for (name, values) in RESULT_COLUMNS.iter().zip(columns) {
        articles.append_column(name, values)?;
    }
    articles.write(&out)?;
    log::info!("wrote {done} rows to {}", out.display());

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_display() {
        assert_eq!(Tally::Count(3).to_string(), "3");
        assert_eq!(Tally::NoIds.to_string(), "No IDs");
        assert_eq!(Tally::Error.to_string(), "Error");
    }

    #[test]
    fn error_outcome_fills_every_cell() {
        assert!(ArticleOutcome::Error.cells().iter().all(|c| c == "Error"));
    }

    #[test]
    fn no_ids_keeps_string_counts() {
        let outcome = ArticleOutcome::NoIds {
            numref: 4,
            by_string: Counts {
                fa: 1,
                la: 0,
                fa_la: 1,
                any: 2,
            },
        };
        let cells = outcome.cells();
        assert_eq!(cells[0], "4");
        assert_eq!(cells[1], "No IDs");
        assert_eq!(cells[5], "1");
        assert_eq!(cells[8], "2");
        assert_eq!(cells[12], "No IDs");
    }

    #[test]
    fn first_and_last_skip_authors_without_ids() {
        use selfcite_scopus::{Abstract, AbstractAuthor, MockSource, Reference};

        let citing_eid = Eid::from_scopus_id("1");
        let cited_eid = Eid::from_scopus_id("202");
        let mut citing = Abstract::new(citing_eid.clone());
        citing.authors = vec![
            AbstractAuthor::new(Some(1), "Noble", "Stephanie"),
            AbstractAuthor::new(Some(3), "Scheinost", "Dustin"),
            AbstractAuthor::new(None, "Smith", "John"),
        ];
        citing.references = Some(vec![Reference {
            position: 1,
            scopus_id: Some("202".into()),
            ..Default::default()
        }]);
        let mut cited = Abstract::new(cited_eid.clone());
        cited.authors = vec![AbstractAuthor::new(Some(3), "Scheinost", "Dustin")];
        let source = MockSource::new().with_abstract(citing).with_abstract(cited);
        let refs = RefIndex {
            authors: [(cited_eid.clone(), "Scheinost, D.".to_string())].into_iter().collect(),
        };

        let mut stats = RunStats::default();
        let outcome = score_article(
            &source,
            &citing_eid,
            "Noble, S., Scheinost, D., Smith, J.",
            &refs,
            &mut stats,
        )
        .unwrap();
        let ArticleOutcome::Scored { by_string, by_id, eids, .. } = outcome else {
            panic!("expected a scored article");
        };
        // The export string still ends with Smith
        assert_eq!(by_string.la, 0);
        assert_eq!(by_id.la, 1);
        assert_eq!(by_id.fa, 0);
        assert_eq!(eids.la, vec![cited_eid]);
    }

    #[test]
    fn eid_lists_are_semicolon_joined() {
        let mut eids = MatchedEids::default();
        eids.any = vec![Eid::from_scopus_id("1"), Eid::from_scopus_id("2")];
        let outcome = ArticleOutcome::Scored {
            numref: 2,
            by_string: Counts::default(),
            by_id: Counts::default(),
            eids,
        };
        assert_eq!(outcome.cells()[12], "2-s2.0-1;2-s2.0-2");
        assert_eq!(outcome.cells()[9], "");
    }
}
