//! Author name normalisation.
//!
//! Scopus spells the same person many ways: `"Müller-Lüdenscheidt, Hans"`,
//! `"Muller Ludenscheidt H."`, `"Müller-Lüdenscheidt, H., Other, A.B."`.
//! [`NameKey`] folds these into a comparable `(surname, given)` pair.

use std::fmt;

use deunicode::deunicode;
use serde::{Deserialize, Serialize};

/// Generational suffixes dropped from multi-token surnames.
const NAME_SUFFIXES: &[&str] = &["ii", "iii", "iv", "jr", "sr"];

/// Substrings (lowercase) marking an author entry as a group, not a person.
const COLLECTIVE_MARKERS: &[&str] = &[
    "consortium",
    "initiative",
    "investigators",
    "group",
    "network",
    "center",
    "psych",
    "schizophrenia",
    "research team",
    "study team",
    "council",
    "collaborator",
    "collaborative members",
    "university",
    "imaging",
    "biomarkers",
    "neurocognition",
    "gemric",
    "million veteran program",
    "adni and ppmi",
    "ddd study",
    "nbb-psy",
];

/// Normalised author name used for set membership.
///
/// `given` is either the first given name (full-name key) or a single
/// letter (initial key). Both parts are ASCII lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameKey {
    surname: String,
    given: String,
}

impl NameKey {
    /// Surname + first given name (`"Smith", "John Paul"` → `smith, john`).
    pub fn full(surname: &str, given: &str) -> Option<Self> {
        let surname = normalize_surname(surname)?;
        let given = first_given(given)?;
        Some(Self { surname, given })
    }

    /// Surname + first initial (`"Smith", "John"` → `smith, j`).
    pub fn initial(surname: &str, given: &str) -> Option<Self> {
        Self::full(surname, given).map(|k| k.to_initial())
    }

    /// Parse a Scopus indexed name (`"Van der Berg J.A."`) into an initial key.
    ///
    /// The last whitespace-separated token holds the initials.
    pub fn from_indexed_name(indexed: &str) -> Option<Self> {
        let trimmed = indexed.trim();
        let (surname, initials) = trimmed.rsplit_once(char::is_whitespace)?;
        Self::initial(surname, initials)
    }

    /// Parse one entry of an export author list into an initial key.
    ///
    /// Accepts `"Smith, J.A."` and `"Smith J.A."`.
    pub fn parse_entry(entry: &str) -> Option<Self> {
        let entry = entry.trim().trim_end_matches(['.', ',', ';']).trim();
        match entry.split_once(',') {
            Some((surname, given)) => Self::initial(surname, given),
            None => Self::from_indexed_name(entry),
        }
    }

    /// Reduce to surname + first initial.
    pub fn to_initial(&self) -> Self {
        Self {
            surname: self.surname.clone(),
            given: self.given.chars().take(1).collect(),
        }
    }

    /// Whether this key only carries an initial.
    pub fn is_initial(&self) -> bool {
        self.given.chars().count() == 1
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn given(&self) -> &str {
        &self.given
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.surname, self.given)
    }
}

/// ASCII-fold, lowercase, hyphens to spaces, drop punctuation except apostrophes.
fn fold(s: &str) -> String {
    let ascii = deunicode(s).to_lowercase();
    let mut out = String::with_capacity(ascii.len());
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() || ch == '\'' || ch == '.' {
            out.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            out.push(' ');
        }
    }
    out
}

fn normalize_surname(surname: &str) -> Option<String> {
    let folded = fold(surname).replace('.', " ");
    let mut tokens: Vec<&str> = folded.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| NAME_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// First given-name token, cut at the first period (`"J.A."` → `j`).
fn first_given(given: &str) -> Option<String> {
    let folded = fold(given);
    let token = folded.split_whitespace().next()?;
    let head = token.split('.').find(|part| !part.is_empty())?;
    let cleaned: String = head.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Whether an author entry names a consortium, study group or institution.
pub fn is_collective_name(entry: &str) -> bool {
    let lower = entry.to_lowercase();
    COLLECTIVE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Parse a Scopus export author string into initial keys.
///
/// Entries are separated by `;` when present, otherwise by `".,"` (the
/// `"Smith, J., Doe, A.B."` export format). Collective names and entries that
/// cannot be parsed are dropped; order is preserved.
pub fn clean_author_list(raw: &str) -> Vec<NameKey> {
    let entries: Vec<&str> = if raw.contains(';') {
        raw.split(';').collect()
    } else {
        raw.split(".,").collect()
    };
    entries
        .into_iter()
        .map(str::trim)
        .filter(|e| !e.is_empty() && !is_collective_name(e))
        .filter_map(NameKey::parse_entry)
        .collect()
}
