//! Self-citation classification.

use serde::Serialize;

use crate::author::{CitedAuthors, CitingAuthors};

/// Why a citing author was considered present in a cited work.
///
/// Ordered by confidence: `Initial < FullName < Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    Initial,
    FullName,
    Id,
}

/// Overall confidence of a reference being a self-citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    None,
    Initial,
    FullName,
    Id,
}

impl From<Evidence> for MatchKind {
    fn from(e: Evidence) -> Self {
        match e {
            Evidence::Initial => Self::Initial,
            Evidence::FullName => Self::FullName,
            Evidence::Id => Self::Id,
        }
    }
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Initial => "initial",
            Self::FullName => "full_name",
            Self::Id => "id",
        }
    }
}

/// Which heuristics may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Compare surname + first given name when IDs disagree
    pub use_full_names: bool,
    /// Fall back to surname + initial when the cited work has no structured data.
    /// Risky for common surname/initial combinations.
    pub allow_initial: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            use_full_names: true,
            allow_initial: false,
        }
    }
}

impl MatchPolicy {
    /// Every heuristic on (used by the export-string pre-filter).
    pub fn permissive() -> Self {
        Self {
            use_full_names: true,
            allow_initial: true,
        }
    }
}

/// One citing author found among the cited authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorMatch {
    /// Index in the citing author list
    pub citing_index: usize,
    pub evidence: Evidence,
    /// Position of the matched author in the cited author list
    pub cited_position: Option<usize>,
}

/// Result of classifying one (citing article, cited work) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfCitation {
    kind: MatchKind,
    matches: Vec<AuthorMatch>,
    citing_len: usize,
}

impl SelfCitation {
    /// Strongest evidence across all matched authors.
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn matches(&self) -> &[AuthorMatch] {
        &self.matches
    }

    pub fn includes(&self, citing_index: usize) -> bool {
        self.matches.iter().any(|m| m.citing_index == citing_index)
    }

    pub fn evidence_for(&self, citing_index: usize) -> Option<Evidence> {
        self.find(citing_index).map(|m| m.evidence)
    }

    /// Position of the citing author in the cited author list.
    pub fn cited_position(&self, citing_index: usize) -> Option<usize> {
        self.find(citing_index).and_then(|m| m.cited_position)
    }

    pub fn first_author(&self) -> bool {
        self.citing_len > 0 && self.includes(0)
    }

    pub fn last_author(&self) -> bool {
        self.citing_len > 0 && self.includes(self.citing_len - 1)
    }

    pub fn first_or_last(&self) -> bool {
        self.first_author() || self.last_author()
    }

    pub fn any(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Number of distinct citing authors matched.
    pub fn count(&self) -> usize {
        self.matches.len()
    }

    fn find(&self, citing_index: usize) -> Option<&AuthorMatch> {
        self.matches.iter().find(|m| m.citing_index == citing_index)
    }
}

/// Decide which citing authors appear among the cited authors.
///
/// Per citing author: an ID hit wins; otherwise a full-name hit; otherwise,
/// only if the cited work carries neither IDs nor full names and the policy
/// allows it, an initial hit.
pub fn classify(citing: &CitingAuthors, cited: &CitedAuthors, policy: MatchPolicy) -> SelfCitation {
    let initials_only = !cited.has_structured();
    let mut matches = Vec::new();

    for (citing_index, author) in citing.iter().enumerate() {
        let by_id = author
            .id
            .filter(|id| cited.contains_id(*id))
            .map(|id| AuthorMatch {
                citing_index,
                evidence: Evidence::Id,
                cited_position: cited.position_of(id),
            });

        let by_name = || {
            author
                .full_name
                .as_ref()
                .filter(|key| policy.use_full_names && cited.contains_full_name(key))
                .map(|key| AuthorMatch {
                    citing_index,
                    evidence: Evidence::FullName,
                    cited_position: cited.full_name_position(key),
                })
        };

        let by_initial = || {
            author
                .initials
                .as_ref()
                .filter(|key| initials_only && policy.allow_initial && cited.contains_initials(key))
                .map(|key| AuthorMatch {
                    citing_index,
                    evidence: Evidence::Initial,
                    cited_position: cited.initials_position(key),
                })
        };

        if let Some(m) = by_id.or_else(by_name).or_else(by_initial) {
            matches.push(m);
        }
    }

    let kind = matches
        .iter()
        .map(|m| MatchKind::from(m.evidence))
        .max()
        .unwrap_or(MatchKind::None);

    SelfCitation {
        kind,
        matches,
        citing_len: citing.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::author::{AuthorId, CitingAuthor};
    use crate::name::NameKey;

    fn citing(authors: &[(Option<u64>, &str, &str)]) -> CitingAuthors {
        authors
            .iter()
            .map(|&(id, s, g)| CitingAuthor::new(id.map(AuthorId), Some(s), Some(g)))
            .collect()
    }

    fn trio() -> CitingAuthors {
        citing(&[
            (Some(1), "Rosenblatt", "Matthew"),
            (Some(2), "Noble", "Stephanie"),
            (Some(3), "Scheinost", "Dustin"),
        ])
    }

    #[test]
    fn empty_citing_never_matches() {
        let cited = CitedAuthors::from_ids([AuthorId(1)]);
        let sc = classify(&CitingAuthors::default(), &cited, MatchPolicy::permissive());
        assert_eq!(sc.kind(), MatchKind::None);
        assert!(!sc.first_author());
        assert!(!sc.last_author());
        assert!(!sc.any());
    }

    #[test]
    fn id_match_records_cited_position() {
        let cited = CitedAuthors::from_ids([AuthorId(99), AuthorId(3)]);
        let sc = classify(&trio(), &cited, MatchPolicy::default());
        assert_eq!(sc.kind(), MatchKind::Id);
        assert!(sc.last_author());
        assert!(!sc.first_author());
        assert!(sc.first_or_last());
        assert_eq!(sc.cited_position(2), Some(1));
        assert_eq!(sc.count(), 1);
    }

    #[test]
    fn full_name_rescues_split_author_profiles() {
        // Same person, two Scopus profiles
        let mut cited = CitedAuthors::new();
        cited.push_author(Some(AuthorId(1000)), Some("Rosenblatt"), Some("Matthew D."));
        let sc = classify(&trio(), &cited, MatchPolicy::default());
        assert_eq!(sc.kind(), MatchKind::FullName);
        assert_eq!(sc.evidence_for(0), Some(Evidence::FullName));
        assert_eq!(sc.cited_position(0), Some(0));
    }

    #[test]
    fn full_names_can_be_disabled() {
        let mut cited = CitedAuthors::new();
        cited.push_author(Some(AuthorId(1000)), Some("Rosenblatt"), Some("Matthew"));
        let policy = MatchPolicy {
            use_full_names: false,
            allow_initial: true,
        };
        assert_eq!(classify(&trio(), &cited, policy).kind(), MatchKind::None);
    }

    #[test]
    fn id_dominates_name_for_same_author() {
        let mut cited = CitedAuthors::new();
        cited.push_author(Some(AuthorId(2)), Some("Noble"), Some("Stephanie"));
        let sc = classify(&trio(), &cited, MatchPolicy::default());
        assert_eq!(sc.evidence_for(1), Some(Evidence::Id));
    }

    #[test]
    fn initials_ignored_when_structured_data_exists() {
        let mut cited = CitedAuthors::new();
        cited.push_author(Some(AuthorId(77)), Some("Other"), Some("Person"));
        cited.add_raw_authors("Noble, S., Other, P.");
        let sc = classify(&trio(), &cited, MatchPolicy::permissive());
        assert_eq!(sc.kind(), MatchKind::None);
    }

    #[test]
    fn initials_require_policy() {
        let cited = CitedAuthors::from_raw_authors("Noble, S., Other, P.");
        assert_eq!(classify(&trio(), &cited, MatchPolicy::default()).kind(), MatchKind::None);

        let sc = classify(&trio(), &cited, MatchPolicy::permissive());
        assert_eq!(sc.kind(), MatchKind::Initial);
        assert!(sc.includes(1));
        assert!(!sc.first_or_last());
        assert!(sc.any());
    }

    #[test]
    fn name_matches_record_cited_position() {
        let mut cited = CitedAuthors::new();
        cited.push_author(None, Some("Other"), Some("Person"));
        cited.push_author(None, Some("Scheinost"), Some("Dustin"));
        let sc = classify(&trio(), &cited, MatchPolicy::default());
        assert_eq!(sc.evidence_for(2), Some(Evidence::FullName));
        assert_eq!(sc.cited_position(2), Some(1));

        let cited = CitedAuthors::from_raw_authors("Other, P., Smith, J., Noble, S.");
        let sc = classify(&trio(), &cited, MatchPolicy::permissive());
        assert_eq!(sc.evidence_for(1), Some(Evidence::Initial));
        assert_eq!(sc.cited_position(1), Some(2));

        let mut cited = CitedAuthors::new();
        cited.add_initials(NameKey::initial("Noble", "S").unwrap());
        let sc = classify(&trio(), &cited, MatchPolicy::permissive());
        assert_eq!(sc.cited_position(1), None);
    }

    #[test]
    fn single_author_is_first_and_last() {
        let solo = citing(&[(Some(5), "Solo", "Han")]);
        let cited = CitedAuthors::from_ids([AuthorId(5)]);
        let sc = classify(&solo, &cited, MatchPolicy::default());
        assert!(sc.first_author());
        assert!(sc.last_author());
        assert_eq!(sc.count(), 1);
    }

    #[test]
    fn kind_is_strongest_evidence() {
        let mut cited = CitedAuthors::new();
        cited.push_author(Some(AuthorId(3)), None, None);
        cited.push_author(None, Some("Rosenblatt"), Some("Matthew"));
        let sc = classify(&trio(), &cited, MatchPolicy::default());
        assert_eq!(sc.kind(), MatchKind::Id);
        assert_eq!(sc.count(), 2);
    }

    #[test]
    fn export_initials_against_export_initials() {
        let citing = CitingAuthors::from_initials(NameKey::parse_entry("Noble, S."));
        let cited = CitedAuthors::from_raw_authors("Noble S.; Doe J.");
        let sc = classify(&citing, &cited, MatchPolicy::permissive());
        assert!(sc.first_author());
        assert_eq!(sc.kind(), MatchKind::Initial);
    }

    #[test]
    fn match_kind_ordering() {
        assert!(MatchKind::Id > MatchKind::FullName);
        assert!(MatchKind::FullName > MatchKind::Initial);
        assert!(MatchKind::Initial > MatchKind::None);
        assert_eq!(MatchKind::FullName.as_str(), "full_name");
    }
}
