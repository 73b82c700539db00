//! Selfcite Collect - self-citation collection pipelines
//!
//! Each pipeline reads Scopus exports or queries Scopus through a
//! [`selfcite_scopus::ScopusSource`], classifies references with
//! [`selfcite_match::classify`] and writes one CSV per unit of work:
//!
//! - [`author`]: every document of one author
//! - [`journal`]: article-level counts for a journal-year export
//! - [`pairs`]: one row per (citing article, reference) with author traits
//! - [`author_info`]: career columns appended to journal results
//! - [`reshape`]: pair rows in long format for model fitting

pub mod author;
pub mod author_info;
pub mod continent;
pub mod export;
pub mod journal;
pub mod layout;
pub mod pairs;
pub mod reshape;
pub mod resolve;
pub mod stats;

pub use author::{AuthorOptions, AuthorReport, run_author};
pub use author_info::run_author_info;
pub use export::{ExportTable, parse_author_ids};
pub use journal::{JournalOptions, Tally, run_journal};
pub use layout::{JournalYear, discover};
pub use pairs::{PairOptions, PairRow, run_pairs};
pub use reshape::{ReshapeOptions, run_reshape};
pub use resolve::{Resolution, ResolvedRef, resolve_eid, resolve_reference};
pub use stats::RunStats;
