//! Citing/cited pair dataset.
//!
//! One row per (citing article, reference): article traits of both sides,
//! self-citation flags for the first and last citing author, and career
//! traits of those two authors. Each journal-year is written to its own
//! file; a journal-year whose file exists is not run again.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use selfcite_core::{ProgressContext, is_shutdown_requested};
use selfcite_match::{AuthorId, MatchPolicy, classify};
use selfcite_scopus::{
    Abstract, AbstractAuthor, CoverDate, DocumentSummary, Eid, ScopusError, ScopusSource,
};

use crate::export::{COL_DOCUMENT_TYPE, ExportTable};
use crate::layout::JournalYear;
use crate::resolve::resolve_reference;
use crate::stats::RunStats;

/// Keywords are collected from this many documents closest in date.
const RECENT_KEYWORD_DOCS: usize = 10;

const KEYWORD_SEPARATOR: &str = ";;;;";

#[derive(Debug, Clone)]
pub struct PairOptions {
    pub out_dir: PathBuf,
}

/// One (citing article, reference) row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairRow {
    pub eid_citing: String,
    pub title_citing: Option<String>,
    pub title_cited: Option<String>,
    pub document_type: Option<String>,
    pub journal_citing: Option<String>,
    pub journal_cited: Option<String>,
    pub date_citing: Option<String>,
    pub date_cited: Option<String>,
    pub year_citing: Option<i32>,
    pub year_cited: Option<i32>,
    pub num_auth_citing: usize,
    pub num_auth_cited: Option<usize>,
    pub num_ref_citing: usize,
    pub sc_fa: Option<u8>,
    pub sc_la: Option<u8>,
    pub sc_any: Option<usize>,
    /// 0-based position of the first citing author among the cited authors
    pub position_fa_sc: Option<usize>,
    pub position_la_sc: Option<usize>,
    pub affil_name_fa: Option<String>,
    pub affil_name_la: Option<String>,
    pub affil_country_fa: Option<String>,
    pub affil_country_la: Option<String>,
    pub academic_age_fa: Option<i32>,
    pub academic_age_la: Option<i32>,
    pub num_prev_papers_fa: Option<usize>,
    pub num_prev_papers_la: Option<usize>,
    pub kw_recent_fa: Option<String>,
    pub kw_recent_la: Option<String>,
    pub auid_fa: Option<u64>,
    pub auid_la: Option<u64>,
    pub name_fa: String,
    pub name_la: String,
    pub surname_fa: Option<String>,
    pub surname_la: Option<String>,
    pub given_name_fa: Option<String>,
    pub given_name_la: Option<String>,
    pub field: String,
    pub eid_cited: Option<String>,
    /// Cascade stage that produced the cited authors
    pub resolution: String,
}

/// Career traits of a citing author at the time of the citing article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorTraits {
    pub auid: Option<AuthorId>,
    /// `"Surname, Given"` as listed on the article
    pub name: String,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub affil_name: Option<String>,
    pub affil_country: Option<String>,
    pub academic_age: Option<i32>,
    pub num_prev_papers: Option<usize>,
    pub kw_recent: Option<String>,
}

/// Look up profile, affiliation and career of one citing author.
///
/// Every lookup may fail independently; failures leave fields empty.
pub fn author_traits<S: ScopusSource>(source: &S, record: &Abstract, author: &AbstractAuthor) -> AuthorTraits {
    let mut traits = AuthorTraits {
        auid: author.auid,
        name: author.display_name(),
        ..Default::default()
    };

    if let Some(afid) = author.first_affiliation() {
        match source.affiliation(afid) {
            Ok(aff) => {
                traits.affil_name = aff.name;
                traits.affil_country = aff.country;
            }
            Err(e) => log::debug!("affiliation {afid}: {e}"),
        }
    }

    let Some(auid) = author.auid else {
        return traits;
    };
    let profile = match source.author(auid) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("author {auid}: {e}");
            return traits;
        }
    };
    traits.surname = profile.surname.clone();
    traits.given_name = profile.given_name.clone();

    let (Some(start), Some(year)) = (profile.start_year(), record.year()) else {
        return traits;
    };
    let docs = match source.author_documents(auid) {
        Ok(docs) if !docs.is_empty() => docs,
        Ok(_) => return traits,
        Err(e) => {
            log::debug!("documents of {auid}: {e}");
            return traits;
        }
    };
    traits.academic_age = Some(year - start);
    traits.num_prev_papers = Some(previous_papers(&docs, &record.eid, record.cover_date));
    traits.kw_recent = recent_keywords(&docs, record.cover_date);
    traits
}

/// Documents published before the citing article.
///
/// `docs` is newest first, so everything after the citing article's own entry
/// is older. When the article is not in the list, count by cover date.
pub fn previous_papers(docs: &[DocumentSummary], citing: &Eid, citing_date: Option<CoverDate>) -> usize {
    if let Some(idx) = docs.iter().position(|d| &d.eid == citing) {
        return docs.len() - idx - 1;
    }
    let Some(citing_date) = citing_date else {
        return 0;
    };
    docs.iter()
        .filter_map(|d| d.cover_date)
        .filter(|d| citing_date.days_until(d) < 0)
        .count()
}

/// Keywords of the documents closest in date to the citing article.
pub fn recent_keywords(docs: &[DocumentSummary], citing_date: Option<CoverDate>) -> Option<String> {
    let citing_date = citing_date?;
    let mut by_distance: Vec<(i64, &DocumentSummary)> = docs
        .iter()
        .map(|d| {
            let distance = d
                .cover_date
                .map_or(i64::MAX, |date| citing_date.days_until(&date).abs());
            (distance, d)
        })
        .collect();
    by_distance.sort_by_key(|(distance, _)| *distance);
    let keywords: Vec<&str> = by_distance
        .into_iter()
        .filter_map(|(_, d)| d.keywords.as_deref())
        .filter(|k| !k.is_empty())
        .take(RECENT_KEYWORD_DOCS)
        .collect();
    (!keywords.is_empty()).then(|| keywords.join(KEYWORD_SEPARATOR))
}

/// Pair rows of one citing article.
pub fn article_pairs<S: ScopusSource>(
    source: &S,
    eid: &Eid,
    document_type: Option<&str>,
    field: &str,
    stats: &mut RunStats,
) -> Result<Vec<PairRow>, ScopusError> {
    let record = source.abstract_full(eid)?;
    let ref_view = source.abstract_refs(eid)?;
    let references = record
        .references
        .as_ref()
        .ok_or_else(|| ScopusError::NotFound(format!("{eid}: no bibliography")))?;

    let named: Vec<&AbstractAuthor> = record.authors.iter().filter(|a| !a.is_collective()).collect();
    let (Some(&first), Some(&last)) = (named.first(), named.last()) else {
        return Err(ScopusError::NotFound(format!("{eid}: no authors")));
    };
    let citing = record.citing_authors();
    let last_index = citing.len().saturating_sub(1);

    let fa = author_traits(source, &record, first);
    let la = if named.len() == 1 {
        fa.clone()
    } else {
        author_traits(source, &record, last)
    };

    let numref = references.len();
    let mut rows = Vec::with_capacity(numref);
    for (i, reference) in references.iter().enumerate() {
        let resolved = resolve_reference(source, reference, Some(&ref_view));
        stats.record_resolution(resolved.resolution);

        let mut row = PairRow {
            eid_citing: eid.to_string(),
            title_citing: record.title.clone(),
            title_cited: resolved.title.clone(),
            document_type: document_type.map(str::to_string).or_else(|| record.subtype.clone()),
            journal_citing: record.publication_name.clone(),
            journal_cited: resolved.source_title.clone(),
            date_citing: record.cover_date.map(|d| d.to_string()),
            date_cited: resolved.cover_date.map(|d| d.to_string()),
            year_citing: record.year(),
            year_cited: resolved.year,
            num_auth_citing: record.authors.len(),
            num_auth_cited: resolved.author_count,
            num_ref_citing: numref,
            field: field.to_string(),
            eid_cited: reference.eid().map(|e| e.to_string()),
            resolution: resolved.resolution.as_str().to_string(),
            ..Default::default()
        };

        if resolved.resolution.is_structured() {
            let sc = classify(&citing, &resolved.cited, MatchPolicy::default());
            row.sc_fa = Some(u8::from(sc.first_author()));
            row.sc_la = Some(u8::from(sc.last_author()));
            row.sc_any = Some(sc.count());
            row.position_fa_sc = sc.cited_position(0);
            row.position_la_sc = sc.cited_position(last_index);
            if sc.any() {
                stats.self_citations += 1;
            }
        }

        fill_author(&mut row, &fa, &la, i == 0);
        rows.push(row);
    }
    Ok(rows)
}

fn fill_author(row: &mut PairRow, fa: &AuthorTraits, la: &AuthorTraits, first_row: bool) {
    row.affil_name_fa = fa.affil_name.clone();
    row.affil_name_la = la.affil_name.clone();
    row.affil_country_fa = fa.affil_country.clone();
    row.affil_country_la = la.affil_country.clone();
    row.academic_age_fa = fa.academic_age;
    row.academic_age_la = la.academic_age;
    row.num_prev_papers_fa = fa.num_prev_papers;
    row.num_prev_papers_la = la.num_prev_papers;
    if first_row {
        row.kw_recent_fa = fa.kw_recent.clone();
        row.kw_recent_la = la.kw_recent.clone();
    }
    row.auid_fa = fa.auid.map(|a| a.0);
    row.auid_la = la.auid.map(|a| a.0);
    row.name_fa = fa.name.clone();
    row.name_la = la.name.clone();
    row.surname_fa = fa.surname.clone();
    row.surname_la = la.surname.clone();
    row.given_name_fa = fa.given_name.clone();
    row.given_name_la = la.given_name.clone();
}

/// Run every journal-year in `units`, one output file each.
pub fn run_pairs<S: ScopusSource>(
    source: &S,
    units: &[JournalYear],
    options: &PairOptions,
    progress: &ProgressContext,
) -> anyhow::Result<RunStats> {
    std::fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("cannot create {}", options.out_dir.display()))?;
    let mut total = RunStats::default();

    for unit in units {
        let out = unit.pairs_path(&options.out_dir);
        if out.exists() {
            log::info!("{}: {} exists, skipping", unit.stem(), out.display());
            continue;
        }
        let stats = run_unit(source, unit, &out, progress)?;
        stats.log(&unit.stem());
        total.merge(&stats);
        if stats.interrupted {
            break;
        }
    }
    Ok(total)
}

fn run_unit<S: ScopusSource>(
    source: &S,
    unit: &JournalYear,
    out: &Path,
    progress: &ProgressContext,
) -> anyhow::Result<RunStats> {
    let start = Instant::now();
    let articles = ExportTable::read_export(&unit.articles_path())?;
    let eids = articles.eids()?;
    let type_col = articles.column(COL_DOCUMENT_TYPE);
    log::info!("{}: {} articles", unit.stem(), articles.len());

    let mut stats = RunStats::new(articles.len());
    let bar = progress.record_bar(&unit.stem(), articles.len() as u64);
    let mut rows = Vec::new();

    for (row, eid) in eids.iter().enumerate() {
        if is_shutdown_requested() {
            log::warn!("Shutdown requested during {}", unit.stem());
            stats.interrupted = true;
            break;
        }
        bar.inc(1);
        let Some(eid) = eid else {
            stats.skipped += 1;
            continue;
        };
        let doc_type = type_col.and_then(|c| articles.get(row, c));
        match article_pairs(source, eid, doc_type, &unit.field, &mut stats) {
            Ok(pairs) => {
                stats.processed += 1;
                rows.extend(pairs);
            }
            Err(e) => {
                stats.skipped += 1;
                if e.is_not_found() {
                    log::debug!("{eid}: {e}");
                } else {
                    log::warn!("{eid}: {e}");
                }
            }
        }
    }
    bar.finish_and_clear();

    // A partial file must not count as done on the next run
    let target = if stats.interrupted {
        out.with_extension("csv.partial")
    } else {
        out.to_path_buf()
    };
    write_pairs(&target, &rows)?;
    stats.elapsed = start.elapsed();
    Ok(stats)
}

pub fn write_pairs(path: &Path, rows: &[PairRow]) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("cannot create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("wrote {} pairs to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_pairs(path: &Path) -> anyhow::Result<Vec<PairRow>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("cannot open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<PairRow>, _>>()
        .with_context(|| format!("malformed pair file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, date: &str, kw: Option<&str>) -> DocumentSummary {
        let mut d = DocumentSummary::new(Eid::from_scopus_id(id), CoverDate::parse(date));
        d.keywords = kw.map(str::to_string);
        d
    }

    #[test]
    fn previous_papers_by_position() {
        let docs = vec![doc("3", "2021-01-01", None), doc("2", "2020-01-01", None), doc("1", "2019-01-01", None)];
        assert_eq!(previous_papers(&docs, &Eid::from_scopus_id("2"), None), 1);
        assert_eq!(previous_papers(&docs, &Eid::from_scopus_id("3"), None), 2);
    }

    #[test]
    fn previous_papers_by_date_when_absent() {
        let docs = vec![doc("3", "2021-01-01", None), doc("1", "2019-01-01", None), doc("0", "2018-06-01", None)];
        let date = CoverDate::parse("2020-01-01");
        assert_eq!(previous_papers(&docs, &Eid::from_scopus_id("9"), date), 2);
        assert_eq!(previous_papers(&docs, &Eid::from_scopus_id("9"), None), 0);
    }

    #[test]
    fn keywords_closest_first() {
        let docs = vec![
            doc("1", "2010-01-01", Some("old")),
            doc("2", "2020-02-01", Some("near")),
            doc("3", "2020-06-01", None),
            doc("4", "2019-06-01", Some("mid")),
        ];
        let kw = recent_keywords(&docs, CoverDate::parse("2020-01-01")).unwrap();
        assert_eq!(kw, "near;;;;mid;;;;old");
    }

    #[test]
    fn keywords_capped() {
        let docs: Vec<_> = (0..15)
            .map(|i| doc(&i.to_string(), &format!("{}-01-01", 2000 + i), Some("k")))
            .collect();
        let kw = recent_keywords(&docs, CoverDate::parse("2014-01-01")).unwrap();
        assert_eq!(kw.matches("k").count(), RECENT_KEYWORD_DOCS);
    }

    #[test]
    fn no_keywords_is_none() {
        let docs = vec![doc("1", "2020-01-01", None)];
        assert_eq!(recent_keywords(&docs, CoverDate::parse("2020-01-01")), None);
        assert_eq!(recent_keywords(&docs, None), None);
    }

    #[test]
    fn pair_rows_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        let row = PairRow {
            eid_citing: "2-s2.0-1".into(),
            sc_fa: Some(1),
            year_citing: Some(2020),
            field: "Neuro".into(),
            resolution: "ref_view".into(),
            ..Default::default()
        };
        write_pairs(&path, std::slice::from_ref(&row)).unwrap();
        assert_eq!(read_pairs(&path).unwrap(), vec![row]);
    }
}
