//! Reconstruct who wrote a cited work.
//!
//! Structured data is often incomplete, so each reference goes through a
//! cascade and the first stage that yields authors wins:
//!
//! 1. the citing article's REF view lists the reference with author IDs
//! 2. the cited record itself is retrieved (FULL view)
//! 3. the printed author string of the reference, as initial keys
//! 4. nothing usable

use selfcite_match::CitedAuthors;
use selfcite_scopus::{CoverDate, Eid, RefView, Reference, ScopusError, ScopusSource};

/// Which cascade stage produced the cited authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    RefView,
    Retrieved,
    RawString,
    Missing,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [Self::RefView, Self::Retrieved, Self::RawString, Self::Missing];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RefView => "ref_view",
            Self::Retrieved => "retrieved",
            Self::RawString => "raw_string",
            Self::Missing => "missing",
        }
    }

    /// Whether IDs or full names are available for matching.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::RefView | Self::Retrieved)
    }
}

/// Authors and metadata of one cited work.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    pub resolution: Resolution,
    pub cited: CitedAuthors,
    pub title: Option<String>,
    pub source_title: Option<String>,
    pub cover_date: Option<CoverDate>,
    pub year: Option<i32>,
    pub author_count: Option<usize>,
}

impl ResolvedRef {
    fn missing() -> Self {
        Self {
            resolution: Resolution::Missing,
            cited: CitedAuthors::new(),
            title: None,
            source_title: None,
            cover_date: None,
            year: None,
            author_count: None,
        }
    }

    fn raw(raw_authors: Option<&str>) -> Self {
        let cited = raw_authors.map(CitedAuthors::from_raw_authors).unwrap_or_default();
        if cited.is_empty() {
            Self::missing()
        } else {
            Self {
                resolution: Resolution::RawString,
                cited,
                ..Self::missing()
            }
        }
    }
}

fn log_failure(eid: &Eid, e: &ScopusError) {
    if e.is_not_found() {
        log::debug!("cited record {eid}: {e}");
    } else {
        log::warn!("cited record {eid}: {e}");
    }
}

/// Resolve a cited work known by EID, falling back to its printed author string.
pub fn resolve_eid<S: ScopusSource>(source: &S, eid: &Eid, raw_authors: Option<&str>) -> ResolvedRef {
    match source.abstract_full(eid) {
        Ok(record) => {
            let cited = record.cited_authors();
            if cited.has_structured() {
                return ResolvedRef {
                    resolution: Resolution::Retrieved,
                    cited,
                    title: record.title.clone(),
                    source_title: record.publication_name.clone(),
                    cover_date: record.cover_date,
                    year: record.year(),
                    author_count: Some(record.authors.len()),
                };
            }
            log::debug!("cited record {eid}: no author IDs or names");
        }
        Err(e) => log_failure(eid, &e),
    }
    ResolvedRef::raw(raw_authors)
}

/// Resolve one FULL-view reference of a citing article.
///
/// `ref_view` is the citing article's REF view when it could be retrieved.
pub fn resolve_reference<S: ScopusSource>(
    source: &S,
    reference: &Reference,
    ref_view: Option<&RefView>,
) -> ResolvedRef {
    let listed = reference
        .scopus_id
        .as_deref()
        .and_then(|id| ref_view.and_then(|v| v.find(id)));

    let mut resolved = match (listed, reference.eid()) {
        (Some(entry), _) if !entry.author_ids().is_empty() => ResolvedRef {
            resolution: Resolution::RefView,
            cited: entry.cited_authors(),
            title: entry.title.clone(),
            source_title: entry.source_title.clone(),
            cover_date: entry.cover_date,
            year: reference.publication_year.or(entry.cover_date.map(|d| d.year())),
            author_count: Some(entry.authors.len()),
        },
        (_, Some(eid)) => resolve_eid(source, &eid, reference.authors_raw.as_deref()),
        (_, None) => ResolvedRef::raw(reference.authors_raw.as_deref()),
    };

    // Bibliography metadata fills whatever the cited record lacked
    if reference.title.is_some() {
        resolved.title = reference.title.clone();
    }
    resolved.source_title = resolved.source_title.or_else(|| reference.source_title.clone());
    resolved.year = resolved.year.or(reference.publication_year);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfcite_match::{AuthorId, NameKey};
    use selfcite_scopus::{Abstract, AbstractAuthor, MockSource, RefAuthor, RefViewEntry};

    fn reference(id: Option<&str>, raw: Option<&str>) -> Reference {
        Reference {
            position: 1,
            scopus_id: id.map(str::to_string),
            title: Some("Cited".into()),
            authors_raw: raw.map(str::to_string),
            publication_year: Some(2018),
            ..Default::default()
        }
    }

    fn view_with(id: &str, auid: Option<u64>) -> RefView {
        RefView {
            total: Some(1),
            entries: vec![RefViewEntry {
                scopus_id: Some(id.into()),
                source_title: Some("Brain".into()),
                authors: vec![RefAuthor {
                    auid: auid.map(AuthorId),
                    surname: Some("Noble".into()),
                    initials: Some("S.".into()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn ref_view_with_ids_wins() {
        let mock = MockSource::new();
        let view = view_with("10", Some(7));
        let r = resolve_reference(&mock, &reference(Some("10"), None), Some(&view));
        assert_eq!(r.resolution, Resolution::RefView);
        assert!(r.cited.contains_id(AuthorId(7)));
        assert_eq!(r.source_title.as_deref(), Some("Brain"));
        assert_eq!(r.year, Some(2018));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn ref_view_without_ids_falls_through_to_retrieval() {
        let mut cited = Abstract::new(Eid::from_scopus_id("10"));
        cited.authors.push(AbstractAuthor::new(Some(8), "Noble", "Stephanie"));
        cited.publication_name = Some("NeuroImage".into());
        let mock = MockSource::new().with_abstract(cited);
        let view = view_with("10", None);

        let r = resolve_reference(&mock, &reference(Some("10"), None), Some(&view));
        assert_eq!(r.resolution, Resolution::Retrieved);
        assert!(r.cited.contains_full_name(&NameKey::full("Noble", "Stephanie").unwrap()));
        assert_eq!(r.source_title.as_deref(), Some("NeuroImage"));
        assert_eq!(r.author_count, Some(1));
        assert_eq!(r.title.as_deref(), Some("Cited"));
    }

    #[test]
    fn not_found_uses_raw_string() {
        let mock = MockSource::new();
        let r = resolve_reference(&mock, &reference(Some("11"), Some("Noble, S.; Doe, J.")), None);
        assert_eq!(r.resolution, Resolution::RawString);
        assert!(!r.resolution.is_structured());
        assert!(r.cited.contains_initials(&NameKey::initial("Doe", "J").unwrap()));
    }

    #[test]
    fn server_error_uses_raw_string() {
        let eid = Eid::from_scopus_id("12");
        let mock = MockSource::new().with_server_error(eid);
        let r = resolve_reference(&mock, &reference(Some("12"), Some("Noble, S.")), None);
        assert_eq!(r.resolution, Resolution::RawString);
    }

    #[test]
    fn retrieved_without_authors_uses_raw_string() {
        let mock = MockSource::new().with_abstract(Abstract::new(Eid::from_scopus_id("13")));
        let r = resolve_reference(&mock, &reference(Some("13"), Some("Noble, S.")), None);
        assert_eq!(r.resolution, Resolution::RawString);
    }

    #[test]
    fn no_id_no_string_is_missing() {
        let mock = MockSource::new();
        let r = resolve_reference(&mock, &reference(None, None), None);
        assert_eq!(r.resolution, Resolution::Missing);
        assert!(r.cited.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn collective_only_string_is_missing() {
        let mock = MockSource::new();
        let r = resolve_reference(&mock, &reference(None, Some("ENIGMA Consortium")), None);
        assert_eq!(r.resolution, Resolution::Missing);
    }
}
