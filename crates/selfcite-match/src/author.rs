//! Citing and cited author sets.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::name::{NameKey, clean_author_list};

/// Scopus author identifier (AUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuthorId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One author of the citing article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitingAuthor {
    pub id: Option<AuthorId>,
    pub full_name: Option<NameKey>,
    pub initials: Option<NameKey>,
}

impl CitingAuthor {
    /// Build from structured Scopus fields; missing parts stay `None`.
    pub fn new(id: Option<AuthorId>, surname: Option<&str>, given: Option<&str>) -> Self {
        let full_name = match (surname, given) {
            (Some(s), Some(g)) => NameKey::full(s, g),
            _ => None,
        };
        let initials = full_name.as_ref().map(NameKey::to_initial);
        Self {
            id,
            full_name,
            initials,
        }
    }

    /// An author only known by a `"Surname, I."` export entry.
    pub fn from_initials(key: NameKey) -> Self {
        Self {
            id: None,
            full_name: None,
            initials: Some(key.to_initial()),
        }
    }

    /// Fill in the initial key from an indexed name when structured names are absent.
    pub fn with_indexed_name(mut self, indexed: &str) -> Self {
        if self.initials.is_none() {
            self.initials = NameKey::from_indexed_name(indexed);
        }
        self
    }
}

/// Ordered author list of a citing article (index 0 = first author).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitingAuthors {
    authors: Vec<CitingAuthor>,
}

impl CitingAuthors {
    pub fn new(authors: Vec<CitingAuthor>) -> Self {
        Self { authors }
    }

    /// Authors known only through an export author string.
    pub fn from_initials(keys: impl IntoIterator<Item = NameKey>) -> Self {
        Self::new(keys.into_iter().map(CitingAuthor::from_initials).collect())
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CitingAuthor> {
        self.authors.get(index)
    }

    pub fn first(&self) -> Option<&CitingAuthor> {
        self.authors.first()
    }

    pub fn last(&self) -> Option<&CitingAuthor> {
        self.authors.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CitingAuthor> {
        self.authors.iter()
    }

    /// Whether any author carries a Scopus ID.
    pub fn has_ids(&self) -> bool {
        self.authors.iter().any(|a| a.id.is_some())
    }

    /// Index of the first author with this ID (1-based "author position" is this + 1).
    pub fn position_of(&self, id: AuthorId) -> Option<usize> {
        self.authors.iter().position(|a| a.id == Some(id))
    }
}

impl FromIterator<CitingAuthor> for CitingAuthors {
    fn from_iter<I: IntoIterator<Item = CitingAuthor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Everything known about the authors of one cited work.
///
/// Any part may be empty; the classifier decides which heuristics apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitedAuthors {
    /// `(position in the cited author list, id)`
    ids: Vec<(usize, AuthorId)>,
    /// Name key to its first position in the cited author list
    full_names: FxHashMap<NameKey, usize>,
    /// Positions are unknown for keys added without a list
    initials: FxHashMap<NameKey, Option<usize>>,
    author_count: usize,
}

impl CitedAuthors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cited work known only by its author IDs, in list order.
    pub fn from_ids(ids: impl IntoIterator<Item = AuthorId>) -> Self {
        let mut cited = Self::new();
        for id in ids {
            cited.push_author(Some(id), None, None);
        }
        cited
    }

    /// Cited work known only by a raw reference author string.
    pub fn from_raw_authors(raw: &str) -> Self {
        let mut cited = Self::new();
        cited.add_raw_authors(raw);
        cited
    }

    /// Append the next author of the cited list.
    pub fn push_author(&mut self, id: Option<AuthorId>, surname: Option<&str>, given: Option<&str>) {
        let position = self.author_count;
        self.author_count += 1;
        if let Some(id) = id {
            self.ids.push((position, id));
        }
        if let (Some(s), Some(g)) = (surname, given) {
            if let Some(full) = NameKey::full(s, g) {
                self.initials.entry(full.to_initial()).or_insert(Some(position));
                self.full_names.entry(full).or_insert(position);
            }
        }
    }

    /// Add initial keys parsed from a reference author string, positioned
    /// by their order in that string.
    pub fn add_raw_authors(&mut self, raw: &str) {
        for (position, key) in clean_author_list(raw).into_iter().enumerate() {
            self.initials.entry(key).or_insert(Some(position));
        }
    }

    /// Add a single initial key (e.g. from an indexed name).
    pub fn add_initials(&mut self, key: NameKey) {
        self.initials.entry(key.to_initial()).or_insert(None);
    }

    /// Whether IDs or full names are available.
    pub fn has_structured(&self) -> bool {
        !self.ids.is_empty() || !self.full_names.is_empty()
    }

    /// Whether nothing at all is known.
    pub fn is_empty(&self) -> bool {
        !self.has_structured() && self.initials.is_empty()
    }

    pub fn contains_id(&self, id: AuthorId) -> bool {
        self.ids.iter().any(|(_, i)| *i == id)
    }

    pub fn contains_full_name(&self, key: &NameKey) -> bool {
        self.full_names.contains_key(key)
    }

    pub fn contains_initials(&self, key: &NameKey) -> bool {
        self.initials.contains_key(key)
    }

    /// Position of `id` in the cited author list (0-based).
    pub fn position_of(&self, id: AuthorId) -> Option<usize> {
        self.ids.iter().find(|(_, i)| *i == id).map(|(p, _)| *p)
    }

    /// First position of a full-name key in the cited author list (0-based).
    pub fn full_name_position(&self, key: &NameKey) -> Option<usize> {
        self.full_names.get(key).copied()
    }

    /// First position of an initial key, when it came from an author list.
    pub fn initials_position(&self, key: &NameKey) -> Option<usize> {
        self.initials.get(key).copied().flatten()
    }

    /// Number of cited authors pushed as structured entries.
    pub fn author_count(&self) -> usize {
        self.author_count
    }

    pub fn ids(&self) -> impl Iterator<Item = AuthorId> + '_ {
        self.ids.iter().map(|(_, id)| *id)
    }
}
