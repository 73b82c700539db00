//! In-memory [`ScopusSource`] for tests and dry runs.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use selfcite_core::HttpError;
use selfcite_match::AuthorId;

use crate::error::ScopusError;
use crate::source::ScopusSource;
use crate::types::{Abstract, Affiliation, AuthorProfile, DocumentSummary, Eid, RefView};

/// Records served from maps; anything absent is `NotFound`.
#[derive(Debug, Default)]
pub struct MockSource {
    abstracts: HashMap<Eid, Abstract>,
    refs: HashMap<Eid, RefView>,
    authors: HashMap<AuthorId, AuthorProfile>,
    documents: HashMap<AuthorId, Vec<DocumentSummary>>,
    affiliations: HashMap<String, Affiliation>,
    /// EIDs that answer with HTTP 500
    failing: HashSet<Eid>,
    calls: Cell<usize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abstract(mut self, record: Abstract) -> Self {
        self.abstracts.insert(record.eid.clone(), record);
        self
    }

    pub fn with_refs(mut self, eid: Eid, view: RefView) -> Self {
        self.refs.insert(eid, view);
        self
    }

    pub fn with_author(mut self, profile: AuthorProfile) -> Self {
        self.authors.insert(profile.auid, profile);
        self
    }

    pub fn with_documents(mut self, auid: AuthorId, docs: Vec<DocumentSummary>) -> Self {
        self.documents.insert(auid, docs);
        self
    }

    pub fn with_affiliation(mut self, affiliation: Affiliation) -> Self {
        self.affiliations.insert(affiliation.id.clone(), affiliation);
        self
    }

    /// Make both abstract views of `eid` fail with a server error.
    pub fn with_server_error(mut self, eid: Eid) -> Self {
        self.failing.insert(eid);
        self
    }

    /// Number of retrieval calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn check_failing(&self, eid: &Eid) -> Result<(), ScopusError> {
        if self.failing.contains(eid) {
            return Err(ScopusError::Http(HttpError::Status {
                status: 500,
                message: "mock server error".into(),
            }));
        }
        Ok(())
    }
}

fn not_found(what: impl ToString) -> ScopusError {
    ScopusError::NotFound(what.to_string())
}

impl ScopusSource for MockSource {
    fn abstract_full(&self, eid: &Eid) -> Result<Abstract, ScopusError> {
        self.tick();
        self.check_failing(eid)?;
        self.abstracts.get(eid).cloned().ok_or_else(|| not_found(eid))
    }

    fn abstract_refs(&self, eid: &Eid) -> Result<RefView, ScopusError> {
        self.tick();
        self.check_failing(eid)?;
        self.refs.get(eid).cloned().ok_or_else(|| not_found(eid))
    }

    fn author(&self, auid: AuthorId) -> Result<AuthorProfile, ScopusError> {
        self.tick();
        self.authors.get(&auid).cloned().ok_or_else(|| not_found(auid))
    }

    fn author_documents(&self, auid: AuthorId) -> Result<Vec<DocumentSummary>, ScopusError> {
        self.tick();
        self.documents.get(&auid).cloned().ok_or_else(|| not_found(auid))
    }

    fn affiliation(&self, id: &str) -> Result<Affiliation, ScopusError> {
        self.tick();
        self.affiliations.get(id).cloned().ok_or_else(|| not_found(id))
    }
}
