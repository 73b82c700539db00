//! Selfcite Scopus - Scopus API records and retrieval
//!
//! Typed views of the Abstract (FULL and REF views), Author, Affiliation and
//! Search APIs, a disk cache for raw responses, and the [`ScopusSource`]
//! trait the pipelines are written against.

pub mod cache;
pub mod client;
pub mod error;
pub mod mock;
pub mod schema;
pub mod source;
pub mod types;

// Re-exports
pub use cache::ResponseCache;
pub use client::{ScopusClient, ScopusConfig};
pub use error::ScopusError;
pub use mock::MockSource;
pub use source::ScopusSource;
pub use types::{
    Abstract, AbstractAuthor, Affiliation, AuthorProfile, CoverDate, DocumentSummary, Eid,
    RefAuthor, RefView, RefViewEntry, Reference,
};
