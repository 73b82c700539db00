//! Self-citation history of a single author.
//!
//! For every document of the author: position in the author list, number of
//! references, references citing the author (`sc_count`) and references
//! citing any co-author (`sc_count_any`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::Serialize;

use selfcite_core::{ProgressContext, is_shutdown_requested};
use selfcite_match::{AuthorId, CitingAuthor, CitingAuthors, MatchPolicy, classify};
use selfcite_scopus::{AuthorProfile, DocumentSummary, ScopusError, ScopusSource};

use crate::resolve::{Resolution, resolve_reference};
use crate::stats::RunStats;

#[derive(Debug, Clone)]
pub struct AuthorOptions {
    pub auid: AuthorId,
    /// Match on surname + initial when a cited work has no structured authors
    pub allow_initial: bool,
    pub out_dir: PathBuf,
}

/// One output row per document; retrieval failures leave the counts empty.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AuthorDocRow {
    pub eid: String,
    pub title: Option<String>,
    pub author_count: Option<usize>,
    pub author_names: Option<String>,
    #[serde(rename = "coverDate")]
    pub cover_date: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    /// 1-based position of the author in the document's author list
    pub auth_position: Option<usize>,
    pub sc_count: Option<usize>,
    pub sc_count_any: Option<usize>,
    pub numref: Option<usize>,
    pub missing_ref_count: Option<usize>,
    pub sc_rate: Option<f64>,
    pub sc_rate_any: Option<f64>,
}

impl AuthorDocRow {
    fn from_summary(doc: &DocumentSummary) -> Self {
        Self {
            eid: doc.eid.to_string(),
            title: doc.title.clone(),
            author_count: doc.author_count,
            author_names: doc.author_names.clone(),
            cover_date: doc.cover_date.map(|d| d.to_string()),
            year: doc.cover_date.map(|d| d.year()),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct AuthorReport {
    pub profile: AuthorProfile,
    pub rows: Vec<AuthorDocRow>,
    pub path: PathBuf,
    pub stats: RunStats,
}

impl AuthorReport {
    /// Σ sc_count / Σ numref over scored documents.
    pub fn overall_rate(&self) -> Option<f64> {
        rate(&self.rows, |r| r.sc_count)
    }

    pub fn overall_rate_any(&self) -> Option<f64> {
        rate(&self.rows, |r| r.sc_count_any)
    }

    /// `(year, sc_count, numref)` per publication year.
    pub fn by_year(&self) -> Vec<(i32, usize, usize)> {
        let mut years: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
        for row in &self.rows {
            if let (Some(year), Some(sc), Some(numref)) = (row.year, row.sc_count, row.numref) {
                let e = years.entry(year).or_default();
                e.0 += sc;
                e.1 += numref;
            }
        }
        years.into_iter().map(|(y, (sc, n))| (y, sc, n)).collect()
    }

    pub fn format_year_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Year").fg(Color::Cyan),
                Cell::new("Self-citations").fg(Color::Cyan),
                Cell::new("References").fg(Color::Cyan),
                Cell::new("Rate").fg(Color::Cyan),
            ]);
        for (year, sc, numref) in self.by_year() {
            table.add_row(vec![
                Cell::new(year),
                Cell::new(sc),
                Cell::new(numref),
                Cell::new(selfcite_core::fmt_rate(sc, numref)),
            ]);
        }
        format!("\n{table}")
    }
}

fn rate(rows: &[AuthorDocRow], count: impl Fn(&AuthorDocRow) -> Option<usize>) -> Option<f64> {
    let (sc, numref) = rows
        .iter()
        .filter_map(|r| Some((count(r)?, r.numref?)))
        .fold((0, 0), |(a, b), (sc, n)| (a + sc, b + n));
    (numref > 0).then(|| sc as f64 / numref as f64)
}

/// Run the single-author pipeline and write `results_df_<name>.csv`.
pub fn run_author<S: ScopusSource>(
    source: &S,
    options: &AuthorOptions,
    progress: &ProgressContext,
) -> anyhow::Result<AuthorReport> {
    let start = Instant::now();
    let profile = source
        .author(options.auid)
        .with_context(|| format!("cannot retrieve author {}", options.auid))?;
    let name = profile.ref_style_name();
    let docs = source
        .author_documents(options.auid)
        .with_context(|| format!("cannot list documents of {name}"))?;
    log::info!("{name}: {} documents", docs.len());

    let policy = MatchPolicy {
        use_full_names: true,
        allow_initial: options.allow_initial,
    };
    let mut stats = RunStats::new(docs.len());
    let bar = progress.record_bar(&name, docs.len() as u64);
    let mut rows = Vec::with_capacity(docs.len());

    for doc in &docs {
        if is_shutdown_requested() {
            log::warn!("Shutdown requested, stopping after {} documents", rows.len());
            stats.interrupted = true;
            break;
        }
        let mut row = AuthorDocRow::from_summary(doc);
        match score_document(source, doc, &profile, policy, &mut stats, &mut row) {
            Ok(()) => stats.processed += 1,
            Err(e) => {
                stats.skipped += 1;
                if e.is_not_found() {
                    log::debug!("{}: {e}", doc.eid);
                } else {
                    log::warn!("{}: {e}", doc.eid);
                }
            }
        }
        rows.push(row);
        bar.inc(1);
    }
    bar.finish_and_clear();

    std::fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("cannot create {}", options.out_dir.display()))?;
    let path = options.out_dir.join(format!("results_df_{name}.csv"));
    write_rows(&path, &rows)?;
    stats.elapsed = start.elapsed();

    Ok(AuthorReport {
        profile,
        rows,
        path,
        stats,
    })
}

/// Fill the count columns of `row` for one document.
fn score_document<S: ScopusSource>(
    source: &S,
    doc: &DocumentSummary,
    profile: &AuthorProfile,
    policy: MatchPolicy,
    stats: &mut RunStats,
    row: &mut AuthorDocRow,
) -> Result<(), ScopusError> {
    let record = source.abstract_full(&doc.eid)?;
    let position = record.authors.iter().position(|a| a.auid == Some(profile.auid));
    row.auth_position = position.map(|p| p + 1);
    if row.year.is_none() {
        row.year = record.year();
    }

    let Some(references) = &record.references else {
        log::debug!("{}: no bibliography", doc.eid);
        return Ok(());
    };

    let ref_view = match source.abstract_refs(&doc.eid) {
        Ok(view) => Some(view),
        Err(e) => {
            log::debug!("{}: REF view unavailable: {e}", doc.eid);
            None
        }
    };

    let citing = record.citing_authors();
    let focal_author = match citing.position_of(profile.auid).and_then(|p| citing.get(p)) {
        Some(author) => author.clone(),
        None => {
            let author = CitingAuthor::new(
                Some(profile.auid),
                profile.surname.as_deref(),
                profile.given_name.as_deref(),
            );
            match &profile.indexed_name {
                Some(indexed) => author.with_indexed_name(indexed),
                None => author,
            }
        }
    };
    let focal = CitingAuthors::new(vec![focal_author]);

    let (mut sc, mut sc_any, mut missing) = (0, 0, 0);
    for reference in references {
        let resolved = resolve_reference(source, reference, ref_view.as_ref());
        stats.record_resolution(resolved.resolution);
        let usable = match resolved.resolution {
            Resolution::Missing => false,
            Resolution::RawString => policy.allow_initial,
            Resolution::RefView | Resolution::Retrieved => true,
        };
        if !usable {
            // References Scopus never resolved to a record are not counted missing
            if reference.scopus_id.is_some() {
                missing += 1;
            }
            continue;
        }
        if classify(&focal, &resolved.cited, policy).any() {
            sc += 1;
        }
        if classify(&citing, &resolved.cited, policy).any() {
            sc_any += 1;
            stats.self_citations += 1;
        }
    }

    let numref = references.len();
    row.numref = Some(numref);
    row.sc_count = Some(sc);
    row.sc_count_any = Some(sc_any);
    row.missing_ref_count = Some(missing);
    if numref > 0 {
        row.sc_rate = Some(sc as f64 / numref as f64);
        row.sc_rate_any = Some(sc_any as f64 / numref as f64);
    }
    Ok(())
}

fn write_rows(path: &Path, rows: &[AuthorDocRow]) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("cannot create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
