//! Selfcite Match - self-citation classification
//!
//! Given who wrote a citing article and whatever is known about the authors
//! of one cited work, decide whether (and how confidently) the citing
//! authors cite themselves.
//!
//! Three independent heuristics, strongest first:
//! 1. Scopus author-ID match
//! 2. full-name match (surname + first given name)
//! 3. surname + first-initial match, only when the cited work has no
//!    structured author data at all
//!
//! Everything here is pure and allocation-light; retrieval lives elsewhere.

pub mod author;
pub mod classify;
pub mod name;

pub use author::{AuthorId, CitedAuthors, CitingAuthor, CitingAuthors};
pub use classify::{AuthorMatch, Evidence, MatchKind, MatchPolicy, SelfCitation, classify};
pub use name::{NameKey, clean_author_list, is_collective_name};
