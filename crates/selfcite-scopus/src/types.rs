//! Typed Scopus records, independent of the JSON wire shape.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use selfcite_match::{
    AuthorId, CitedAuthors, CitingAuthor, CitingAuthors, NameKey, is_collective_name,
};

/// Prefix Scopus puts in front of a numeric record id to form an EID.
const EID_PREFIX: &str = "2-s2.0-";

/// Scopus electronic identifier (`2-s2.0-85085763458`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eid(String);

impl Eid {
    /// Accept a full EID or a bare numeric Scopus id.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(id) = s.strip_prefix(EID_PREFIX) {
            (!id.is_empty()).then(|| Self(s.to_string()))
        } else if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            Some(Self::from_scopus_id(s))
        } else {
            None
        }
    }

    /// Build from the numeric id found in reference lists.
    pub fn from_scopus_id(id: &str) -> Self {
        Self(format!("{EID_PREFIX}{}", id.trim()))
    }

    /// Numeric part after the `2-s2.0-` prefix.
    pub fn scopus_id(&self) -> &str {
        self.0.strip_prefix(EID_PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Eid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("not a Scopus EID: {s:?}"))
    }
}

/// Publication cover date.
///
/// Scopus writes unknown month/day as `00`; those become `01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverDate(NaiveDate);

impl CoverDate {
    /// Parse `YYYY-MM-DD`, `YYYY-MM` or `YYYY` (trailing time parts ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut parts = s.get(..10.min(s.len()))?.split('-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month = parts.next().map_or(Some(1), parse_part)?;
        let day = parts.next().map_or(Some(1), parse_part)?;
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Signed day distance `other - self`.
    pub fn days_until(&self, other: &CoverDate) -> i64 {
        (other.0 - self.0).num_days()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

fn parse_part(p: &str) -> Option<u32> {
    let v: u32 = p.parse().ok()?;
    Some(v.max(1))
}

impl fmt::Display for CoverDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Author entry of an abstract (FULL view).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbstractAuthor {
    pub auid: Option<AuthorId>,
    pub indexed_name: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    /// Affiliation ids in document order
    pub affiliation_ids: Vec<String>,
}

impl AbstractAuthor {
    pub fn new(auid: Option<u64>, surname: &str, given_name: &str) -> Self {
        Self {
            auid: auid.map(AuthorId),
            indexed_name: given_name
                .chars()
                .next()
                .map(|c| format!("{surname} {c}.")),
            surname: Some(surname.to_string()),
            given_name: Some(given_name.to_string()),
            affiliation_ids: Vec::new(),
        }
    }

    /// `"Surname, Given"` with missing parts written as `None`.
    pub fn display_name(&self) -> String {
        format!(
            "{}, {}",
            self.surname.as_deref().unwrap_or("None"),
            self.given_name.as_deref().unwrap_or("None")
        )
    }

    pub fn to_citing(&self) -> CitingAuthor {
        let author = CitingAuthor::new(self.auid, self.surname.as_deref(), self.given_name.as_deref());
        match &self.indexed_name {
            Some(indexed) => author.with_indexed_name(indexed),
            None => author,
        }
    }

    /// A consortium or study group listed as an author.
    pub fn is_collective(&self) -> bool {
        self.given_name.is_none()
            && [&self.surname, &self.indexed_name]
                .into_iter()
                .flatten()
                .any(|n| is_collective_name(n))
    }

    pub fn first_affiliation(&self) -> Option<&str> {
        self.affiliation_ids.first().map(String::as_str)
    }
}

/// Author entry inside a reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefAuthor {
    pub auid: Option<AuthorId>,
    pub indexed_name: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    /// `"S.A."` style initials
    pub initials: Option<String>,
}

impl RefAuthor {
    /// `"Surname, I."` as used in reference author strings.
    pub fn ref_style(&self) -> Option<String> {
        match (&self.surname, &self.initials, &self.indexed_name) {
            (Some(s), Some(i), _) => Some(format!("{s}, {i}")),
            (_, _, Some(indexed)) => Some(indexed.clone()),
            (Some(s), None, None) => Some(s.clone()),
            _ => None,
        }
    }

    /// Initial key from whichever name parts are present.
    pub fn initial_key(&self) -> Option<NameKey> {
        match (&self.surname, &self.given_name, &self.initials) {
            (Some(s), Some(g), _) | (Some(s), None, Some(g)) => NameKey::initial(s, g),
            _ => self.indexed_name.as_deref().and_then(NameKey::from_indexed_name),
        }
    }
}

/// One reference of a FULL-view abstract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// 1-based position in the bibliography
    pub position: usize,
    /// Numeric Scopus id of the cited record, when Scopus resolved it
    pub scopus_id: Option<String>,
    pub title: Option<String>,
    pub source_title: Option<String>,
    pub publication_year: Option<i32>,
    /// `"Surname, I.; Other, A.B."` as printed in the bibliography
    pub authors_raw: Option<String>,
    pub authors: Vec<RefAuthor>,
}

impl Reference {
    pub fn eid(&self) -> Option<Eid> {
        self.scopus_id.as_deref().map(Eid::from_scopus_id)
    }

    /// Initial keys from the printed author string.
    pub fn raw_cited_authors(&self) -> CitedAuthors {
        let mut cited = CitedAuthors::new();
        if let Some(raw) = &self.authors_raw {
            cited.add_raw_authors(raw);
        }
        cited
    }
}

/// Abstract Retrieval, FULL view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abstract {
    pub eid: Eid,
    pub title: Option<String>,
    pub publication_name: Option<String>,
    pub cover_date: Option<CoverDate>,
    /// e.g. "Article", "Review"
    pub subtype: Option<String>,
    pub authors: Vec<AbstractAuthor>,
    /// `None` when Scopus has no bibliography for the record
    pub references: Option<Vec<Reference>>,
}

impl Abstract {
    pub fn new(eid: Eid) -> Self {
        Self {
            eid,
            title: None,
            publication_name: None,
            cover_date: None,
            subtype: None,
            authors: Vec::new(),
            references: None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.cover_date.map(|d| d.year())
    }

    pub fn author_ids(&self) -> Vec<AuthorId> {
        self.authors.iter().filter_map(|a| a.auid).collect()
    }

    /// This record as the citing side, without collective authors.
    pub fn citing_authors(&self) -> CitingAuthors {
        self.authors
            .iter()
            .filter(|a| !a.is_collective())
            .map(AbstractAuthor::to_citing)
            .collect()
    }

    /// This record as the cited side.
    ///
    /// Indexed names are added as initial keys so an author list without
    /// IDs or full names can still be matched on initials.
    pub fn cited_authors(&self) -> CitedAuthors {
        let mut cited = CitedAuthors::new();
        for author in &self.authors {
            cited.push_author(author.auid, author.surname.as_deref(), author.given_name.as_deref());
            if let Some(key) = author.indexed_name.as_deref().and_then(NameKey::from_indexed_name) {
                cited.add_initials(key);
            }
        }
        cited
    }

    pub fn reference_count(&self) -> Option<usize> {
        self.references.as_ref().map(Vec::len)
    }
}

/// One reference of the REF view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefViewEntry {
    pub scopus_id: Option<String>,
    pub title: Option<String>,
    pub source_title: Option<String>,
    pub cover_date: Option<CoverDate>,
    pub authors: Vec<RefAuthor>,
}

impl RefViewEntry {
    pub fn author_ids(&self) -> Vec<AuthorId> {
        self.authors.iter().filter_map(|a| a.auid).collect()
    }

    /// IDs and full names where given names are present; initials for the rest.
    pub fn cited_authors(&self) -> CitedAuthors {
        let mut cited = CitedAuthors::new();
        for author in &self.authors {
            cited.push_author(author.auid, author.surname.as_deref(), author.given_name.as_deref());
            if author.given_name.is_none() {
                if let Some(key) = author.initial_key() {
                    cited.add_initials(key);
                }
            }
        }
        cited
    }
}

/// Abstract Retrieval, REF view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefView {
    pub total: Option<usize>,
    pub entries: Vec<RefViewEntry>,
}

impl RefView {
    /// Entry for a cited record, by numeric Scopus id.
    pub fn find(&self, scopus_id: &str) -> Option<&RefViewEntry> {
        self.entries
            .iter()
            .find(|e| e.scopus_id.as_deref() == Some(scopus_id))
    }
}

/// Author Retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorProfile {
    pub auid: AuthorId,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub indexed_name: Option<String>,
    /// First and last publication year
    pub publication_range: Option<(i32, i32)>,
}

impl AuthorProfile {
    pub fn start_year(&self) -> Option<i32> {
        self.publication_range.map(|(start, _)| start)
    }

    /// Years since the first publication, as of `year`.
    pub fn academic_age(&self, year: i32) -> Option<i32> {
        self.start_year().map(|start| year - start)
    }

    /// `"Surname, I."` form of the indexed name, used in file names and reports.
    pub fn ref_style_name(&self) -> String {
        match &self.indexed_name {
            Some(indexed) => indexed.replacen(' ', ", ", 1),
            None => self.auid.to_string(),
        }
    }
}

/// One row of an author's document list (Scopus Search).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub eid: Eid,
    pub title: Option<String>,
    pub cover_date: Option<CoverDate>,
    pub author_count: Option<usize>,
    /// `;`-joined author names
    pub author_names: Option<String>,
    /// Author keywords, `|`-separated as Scopus returns them
    pub keywords: Option<String>,
}

impl DocumentSummary {
    pub fn new(eid: Eid, cover_date: Option<CoverDate>) -> Self {
        Self {
            eid,
            title: None,
            cover_date,
            author_count: None,
            author_names: None,
            keywords: None,
        }
    }
}

/// Affiliation Retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affiliation {
    pub id: String,
    pub name: Option<String>,
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eid_from_bare_id() {
        let eid = Eid::parse("85085763458").unwrap();
        assert_eq!(eid.as_str(), "2-s2.0-85085763458");
        assert_eq!(eid.scopus_id(), "85085763458");
    }

    #[test]
    fn eid_full_form_kept() {
        assert_eq!(Eid::parse(" 2-s2.0-0033949096 ").unwrap().as_str(), "2-s2.0-0033949096");
        assert!(Eid::parse("2-s2.0-").is_none());
        assert!(Eid::parse("doi:10.1/x").is_none());
    }

    #[test]
    fn cover_date_zero_parts_become_first() {
        assert_eq!(CoverDate::parse("2020-00-00"), CoverDate::from_ymd(2020, 1, 1));
        assert_eq!(CoverDate::parse("2019-07-00"), CoverDate::from_ymd(2019, 7, 1));
    }

    #[test]
    fn cover_date_partial_forms() {
        assert_eq!(CoverDate::parse("2018"), CoverDate::from_ymd(2018, 1, 1));
        assert_eq!(CoverDate::parse("2018-03"), CoverDate::from_ymd(2018, 3, 1));
        assert_eq!(CoverDate::parse("2018-03-05T00:00:00"), CoverDate::from_ymd(2018, 3, 5));
        assert_eq!(CoverDate::parse("n.d."), None);
    }

    #[test]
    fn cover_date_days_until_signed() {
        let a = CoverDate::from_ymd(2020, 1, 1).unwrap();
        let b = CoverDate::from_ymd(2020, 1, 11).unwrap();
        assert_eq!(a.days_until(&b), 10);
        assert_eq!(b.days_until(&a), -10);
        assert_eq!(a.to_string(), "2020-01-01");
    }

    #[test]
    fn display_name_tolerates_missing_parts() {
        let mut a = AbstractAuthor::new(Some(1), "Noble", "Stephanie");
        assert_eq!(a.display_name(), "Noble, Stephanie");
        a.given_name = None;
        assert_eq!(a.display_name(), "Noble, None");
    }

    #[test]
    fn abstract_cited_authors_include_indexed_initials() {
        let mut ab = Abstract::new(Eid::from_scopus_id("1"));
        ab.authors.push(AbstractAuthor {
            indexed_name: Some("Noble S.".into()),
            ..Default::default()
        });
        let cited = ab.cited_authors();
        assert!(!cited.has_structured());
        assert!(cited.contains_initials(&NameKey::initial("Noble", "S").unwrap()));
    }

    #[test]
    fn collective_authors_are_not_citing() {
        let mut ab = Abstract::new(Eid::from_scopus_id("1"));
        ab.authors.push(AbstractAuthor::new(Some(1), "Noble", "Stephanie"));
        ab.authors.push(AbstractAuthor {
            surname: Some("ENIGMA Consortium".into()),
            ..Default::default()
        });
        let citing = ab.citing_authors();
        assert_eq!(citing.len(), 1);
        assert_eq!(citing.last().unwrap().id, Some(AuthorId(1)));
    }

    #[test]
    fn profile_ref_style_name() {
        let p = AuthorProfile {
            auid: AuthorId(9),
            surname: None,
            given_name: None,
            indexed_name: Some("Rosenblatt M.".into()),
            publication_range: Some((2016, 2024)),
        };
        assert_eq!(p.ref_style_name(), "Rosenblatt, M.");
        assert_eq!(p.academic_age(2020), Some(4));
    }

    #[test]
    fn ref_author_without_given_name_yields_initials() {
        let entry = RefViewEntry {
            authors: vec![RefAuthor {
                surname: Some("Scheinost".into()),
                initials: Some("D.".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let cited = entry.cited_authors();
        assert!(cited.contains_initials(&NameKey::initial("Scheinost", "D").unwrap()));
        assert_eq!(entry.authors[0].ref_style().as_deref(), Some("Scheinost, D."));
    }

    #[test]
    fn ref_view_find_by_id() {
        let view = RefView {
            total: Some(1),
            entries: vec![RefViewEntry {
                scopus_id: Some("42".into()),
                ..Default::default()
            }],
        };
        assert!(view.find("42").is_some());
        assert!(view.find("43").is_none());
    }
}
