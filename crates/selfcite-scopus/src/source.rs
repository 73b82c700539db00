//! The retrieval seam the pipelines are written against.

use selfcite_match::AuthorId;

use crate::error::ScopusError;
use crate::types::{Abstract, Affiliation, AuthorProfile, DocumentSummary, Eid, RefView};

/// Read access to Scopus records.
///
/// Implemented over HTTP by [`crate::ScopusClient`] and in memory by
/// [`crate::MockSource`].
pub trait ScopusSource {
    /// Abstract Retrieval, FULL view (metadata, authors, bibliography).
    fn abstract_full(&self, eid: &Eid) -> Result<Abstract, ScopusError>;

    /// Abstract Retrieval, REF view (references with author IDs).
    fn abstract_refs(&self, eid: &Eid) -> Result<RefView, ScopusError>;

    fn author(&self, auid: AuthorId) -> Result<AuthorProfile, ScopusError>;

    /// All documents of an author, newest first.
    fn author_documents(&self, auid: AuthorId) -> Result<Vec<DocumentSummary>, ScopusError>;

    fn affiliation(&self, id: &str) -> Result<Affiliation, ScopusError>;
}

impl<T: ScopusSource + ?Sized> ScopusSource for &T {
    fn abstract_full(&self, eid: &Eid) -> Result<Abstract, ScopusError> {
        (**self).abstract_full(eid)
    }

    fn abstract_refs(&self, eid: &Eid) -> Result<RefView, ScopusError> {
        (**self).abstract_refs(eid)
    }

    fn author(&self, auid: AuthorId) -> Result<AuthorProfile, ScopusError> {
        (**self).author(auid)
    }

    fn author_documents(&self, auid: AuthorId) -> Result<Vec<DocumentSummary>, ScopusError> {
        (**self).author_documents(auid)
    }

    fn affiliation(&self, id: &str) -> Result<Affiliation, ScopusError> {
        (**self).affiliation(id)
    }
}
