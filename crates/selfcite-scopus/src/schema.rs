//! Scopus JSON wire format.
//!
//! Scopus JSON is converted from XML and it shows: a list of one element
//! comes back as a bare object, text may be wrapped as `{"$": "..."}`,
//! numbers are strings and any field may be `null`. The raw structs here
//! absorb that; `parse_*` functions turn them into [`crate::types`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use selfcite_match::AuthorId;

use crate::error::ScopusError;
use crate::types::{
    Abstract, AbstractAuthor, Affiliation, AuthorProfile, CoverDate, DocumentSummary, Eid,
    RefAuthor, RefView, RefViewEntry, Reference,
};

// === Lenient field deserializers ===

/// Text from a string, a number or a `{"$": ..}` wrapper. Empty text is `None`.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?))
}

fn value_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => return map.get("$").and_then(value_text),
        Value::Array(items) => return items.first().and_then(value_text),
        Value::Null | Value::Bool(_) => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// A number that may arrive as a string.
fn number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?).and_then(|s| s.parse().ok()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// A list that may be a bare object or `null`.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(t)) => vec![t],
        None => Vec::new(),
    })
}

// === Abstract Retrieval (FULL view) ===

#[derive(Debug, Deserialize)]
struct AbstractEnvelope {
    #[serde(rename = "abstracts-retrieval-response")]
    response: Option<AbstractResponse>,
}

#[derive(Debug, Deserialize)]
struct AbstractResponse {
    #[serde(default)]
    coredata: Option<CoreData>,
    #[serde(default)]
    authors: Option<AuthorGroup>,
    #[serde(default)]
    item: Option<Item>,
    #[serde(default)]
    references: Option<RefViewList>,
}

#[derive(Debug, Deserialize)]
struct CoreData {
    #[serde(default, deserialize_with = "text")]
    eid: Option<String>,
    #[serde(rename = "dc:title", default, deserialize_with = "text")]
    title: Option<String>,
    #[serde(rename = "prism:publicationName", default, deserialize_with = "text")]
    publication_name: Option<String>,
    #[serde(rename = "prism:coverDate", default, deserialize_with = "text")]
    cover_date: Option<String>,
    #[serde(rename = "subtypeDescription", default, deserialize_with = "text")]
    subtype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorGroup {
    #[serde(default, deserialize_with = "one_or_many")]
    author: Vec<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(rename = "@auid", default, deserialize_with = "number")]
    auid: Option<u64>,
    #[serde(rename = "ce:indexed-name", default, deserialize_with = "text")]
    indexed_name: Option<String>,
    #[serde(rename = "ce:surname", default, deserialize_with = "text")]
    surname: Option<String>,
    #[serde(rename = "ce:given-name", default, deserialize_with = "text")]
    given_name: Option<String>,
    #[serde(rename = "ce:initials", default, deserialize_with = "text")]
    initials: Option<String>,
    #[serde(rename = "preferred-name", default)]
    preferred_name: Option<PreferredName>,
    #[serde(default, deserialize_with = "one_or_many")]
    affiliation: Vec<AffiliationRef>,
}

#[derive(Debug, Deserialize)]
struct PreferredName {
    #[serde(rename = "ce:surname", alias = "surname", default, deserialize_with = "text")]
    surname: Option<String>,
    #[serde(rename = "ce:given-name", alias = "given-name", default, deserialize_with = "text")]
    given_name: Option<String>,
    #[serde(rename = "ce:indexed-name", alias = "indexed-name", default, deserialize_with = "text")]
    indexed_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AffiliationRef {
    #[serde(rename = "@id", default, deserialize_with = "text")]
    id: Option<String>,
}

impl RawAuthor {
    fn into_abstract_author(self) -> AbstractAuthor {
        let preferred = self.preferred_name;
        let pick = |own: Option<String>, pref: Option<&Option<String>>| {
            own.or_else(|| pref.and_then(Clone::clone))
        };
        AbstractAuthor {
            auid: self.auid.map(AuthorId),
            indexed_name: pick(self.indexed_name, preferred.as_ref().map(|p| &p.indexed_name)),
            surname: pick(self.surname, preferred.as_ref().map(|p| &p.surname)),
            given_name: pick(self.given_name, preferred.as_ref().map(|p| &p.given_name)),
            affiliation_ids: self.affiliation.into_iter().filter_map(|a| a.id).collect(),
        }
    }

    fn into_ref_author(self) -> RefAuthor {
        RefAuthor {
            auid: self.auid.map(AuthorId),
            indexed_name: self.indexed_name,
            surname: self.surname,
            given_name: self.given_name,
            initials: self.initials,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    bibrecord: Option<BibRecord>,
}

#[derive(Debug, Deserialize)]
struct BibRecord {
    #[serde(default)]
    tail: Option<Tail>,
}

#[derive(Debug, Deserialize)]
struct Tail {
    #[serde(default)]
    bibliography: Option<Bibliography>,
}

#[derive(Debug, Deserialize)]
struct Bibliography {
    #[serde(default, deserialize_with = "one_or_many")]
    reference: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(rename = "@id", default, deserialize_with = "number")]
    id: Option<u64>,
    #[serde(rename = "ref-info", default)]
    info: Option<RefInfo>,
}

#[derive(Debug, Deserialize)]
struct RefInfo {
    #[serde(rename = "ref-title", default)]
    title: Option<RefTitle>,
    #[serde(rename = "refd-itemidlist", default)]
    item_ids: Option<ItemIdList>,
    #[serde(rename = "ref-authors", default)]
    authors: Option<AuthorGroup>,
    #[serde(rename = "ref-sourcetitle", default, deserialize_with = "text")]
    source_title: Option<String>,
    #[serde(rename = "ref-publicationyear", default)]
    year: Option<PublicationYear>,
}

#[derive(Debug, Deserialize)]
struct RefTitle {
    #[serde(rename = "ref-titletext", default, deserialize_with = "text")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemIdList {
    #[serde(default, deserialize_with = "one_or_many")]
    itemid: Vec<ItemId>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "$", default, deserialize_with = "text")]
    value: Option<String>,
    #[serde(rename = "@idtype", default, deserialize_with = "text")]
    id_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicationYear {
    #[serde(rename = "@first", default, deserialize_with = "number")]
    first: Option<u64>,
}

impl RawReference {
    fn into_reference(self, index: usize) -> Reference {
        let position = self.id.map_or(index + 1, |id| id as usize);
        let Some(info) = self.info else {
            return Reference {
                position,
                ..Default::default()
            };
        };
        let scopus_id = info.item_ids.and_then(|list| {
            list.itemid
                .into_iter()
                .find(|i| i.id_type.as_deref() == Some("SGR"))
                .and_then(|i| i.value)
        });
        let authors: Vec<RefAuthor> = info
            .authors
            .map(|g| g.author.into_iter().map(RawAuthor::into_ref_author).collect())
            .unwrap_or_default();
        let joined: Vec<String> = authors.iter().filter_map(RefAuthor::ref_style).collect();
        Reference {
            position,
            scopus_id,
            title: info.title.and_then(|t| t.text),
            source_title: info.source_title,
            publication_year: info.year.and_then(|y| y.first).map(|y| y as i32),
            authors_raw: (!joined.is_empty()).then(|| joined.join("; ")),
            authors,
        }
    }
}

fn abstract_response(body: &str, what: &str) -> Result<AbstractResponse, ScopusError> {
    let envelope: AbstractEnvelope =
        serde_json::from_str(body).map_err(|e| ScopusError::decode(what, e))?;
    envelope
        .response
        .ok_or_else(|| ScopusError::NotFound(what.to_string()))
}

/// Parse an Abstract Retrieval response (FULL view).
pub fn parse_abstract(body: &str, requested: &Eid) -> Result<Abstract, ScopusError> {
    let response = abstract_response(body, requested.as_str())?;
    let core = response.coredata;
    let eid = core
        .as_ref()
        .and_then(|c| c.eid.as_deref())
        .and_then(Eid::parse)
        .unwrap_or_else(|| requested.clone());

    let authors = response
        .authors
        .map(|g| g.author.into_iter().map(RawAuthor::into_abstract_author).collect())
        .unwrap_or_default();

    let references = response
        .item
        .and_then(|i| i.bibrecord)
        .and_then(|b| b.tail)
        .and_then(|t| t.bibliography)
        .map(|bib| {
            bib.reference
                .into_iter()
                .enumerate()
                .map(|(i, r)| r.into_reference(i))
                .collect()
        });

    let mut record = Abstract::new(eid);
    if let Some(core) = core {
        record.title = core.title;
        record.publication_name = core.publication_name;
        record.cover_date = core.cover_date.as_deref().and_then(CoverDate::parse);
        record.subtype = core.subtype;
    }
    record.authors = authors;
    record.references = references;
    Ok(record)
}

// === Abstract Retrieval (REF view) ===

#[derive(Debug, Deserialize)]
struct RefViewList {
    #[serde(rename = "@total-references", default, deserialize_with = "number")]
    total: Option<u64>,
    #[serde(default, deserialize_with = "one_or_many")]
    reference: Vec<RawRefViewEntry>,
}

#[derive(Debug, Deserialize)]
struct RawRefViewEntry {
    #[serde(rename = "scopus-id", default, deserialize_with = "text")]
    scopus_id: Option<String>,
    #[serde(default, deserialize_with = "text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "text")]
    sourcetitle: Option<String>,
    #[serde(rename = "prism:coverDate", default, deserialize_with = "text")]
    cover_date: Option<String>,
    #[serde(rename = "author-list", default)]
    author_list: Option<AuthorGroup>,
}

/// Parse an Abstract Retrieval response (REF view).
pub fn parse_ref_view(body: &str, requested: &Eid) -> Result<RefView, ScopusError> {
    let response = abstract_response(body, requested.as_str())?;
    let Some(list) = response.references else {
        return Ok(RefView::default());
    };
    let entries = list
        .reference
        .into_iter()
        .map(|r| RefViewEntry {
            scopus_id: r.scopus_id,
            title: r.title,
            source_title: r.sourcetitle,
            cover_date: r.cover_date.as_deref().and_then(CoverDate::parse),
            authors: r
                .author_list
                .map(|g| g.author.into_iter().map(RawAuthor::into_ref_author).collect())
                .unwrap_or_default(),
        })
        .collect();
    Ok(RefView {
        total: list.total.map(|t| t as usize),
        entries,
    })
}

// === Author Retrieval ===

#[derive(Debug, Deserialize)]
struct AuthorEnvelope {
    #[serde(rename = "author-retrieval-response", default, deserialize_with = "one_or_many")]
    response: Vec<AuthorResponse>,
}

#[derive(Debug, Deserialize)]
struct AuthorResponse {
    #[serde(rename = "author-profile", default)]
    profile: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(rename = "preferred-name", default)]
    preferred_name: Option<PreferredName>,
    #[serde(rename = "publication-range", default)]
    publication_range: Option<PublicationRange>,
}

#[derive(Debug, Deserialize)]
struct PublicationRange {
    #[serde(rename = "@start", default, deserialize_with = "number")]
    start: Option<u64>,
    #[serde(rename = "@end", default, deserialize_with = "number")]
    end: Option<u64>,
}

/// Parse an Author Retrieval response (ENHANCED view).
pub fn parse_author(body: &str, auid: AuthorId) -> Result<AuthorProfile, ScopusError> {
    let what = format!("author {auid}");
    let envelope: AuthorEnvelope =
        serde_json::from_str(body).map_err(|e| ScopusError::decode(&what, e))?;
    let profile = envelope
        .response
        .into_iter()
        .next()
        .and_then(|r| r.profile)
        .ok_or(ScopusError::NotFound(what))?;
    let name = profile.preferred_name;
    let range = profile.publication_range.and_then(|r| {
        let start = r.start? as i32;
        Some((start, r.end.map_or(start, |e| e as i32)))
    });
    Ok(AuthorProfile {
        auid,
        surname: name.as_ref().and_then(|n| n.surname.clone()),
        given_name: name.as_ref().and_then(|n| n.given_name.clone()),
        indexed_name: name.and_then(|n| n.indexed_name),
        publication_range: range,
    })
}

// === Affiliation Retrieval ===

#[derive(Debug, Deserialize)]
struct AffiliationEnvelope {
    #[serde(rename = "affiliation-retrieval-response")]
    response: Option<RawAffiliation>,
}

#[derive(Debug, Deserialize)]
struct RawAffiliation {
    #[serde(rename = "affiliation-name", default, deserialize_with = "text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    country: Option<String>,
}

/// Parse an Affiliation Retrieval response.
pub fn parse_affiliation(body: &str, id: &str) -> Result<Affiliation, ScopusError> {
    let what = format!("affiliation {id}");
    let envelope: AffiliationEnvelope =
        serde_json::from_str(body).map_err(|e| ScopusError::decode(&what, e))?;
    let raw = envelope.response.ok_or(ScopusError::NotFound(what))?;
    Ok(Affiliation {
        id: id.to_string(),
        name: raw.name,
        country: raw.country,
    })
}

// === Scopus Search ===

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "search-results")]
    results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "opensearch:totalResults", default, deserialize_with = "number")]
    total: Option<u64>,
    #[serde(default, deserialize_with = "one_or_many")]
    entry: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(default, deserialize_with = "text")]
    eid: Option<String>,
    #[serde(rename = "dc:title", default, deserialize_with = "text")]
    title: Option<String>,
    #[serde(rename = "prism:coverDate", default, deserialize_with = "text")]
    cover_date: Option<String>,
    #[serde(rename = "author-count", default, deserialize_with = "number")]
    author_count: Option<u64>,
    #[serde(default, deserialize_with = "one_or_many")]
    author: Vec<SearchAuthor>,
    #[serde(default, deserialize_with = "text")]
    authkeywords: Option<String>,
    /// Present on the placeholder entry of an empty result set
    #[serde(default, deserialize_with = "text")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchAuthor {
    #[serde(default, deserialize_with = "text")]
    authname: Option<String>,
}

/// One page of Scopus Search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub total: usize,
    pub documents: Vec<DocumentSummary>,
}

/// Parse a Scopus Search response page (COMPLETE view).
pub fn parse_search_page(body: &str, what: &str) -> Result<SearchPage, ScopusError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| ScopusError::decode(what, e))?;
    let Some(results) = envelope.results else {
        return Ok(SearchPage::default());
    };
    let documents = results
        .entry
        .into_iter()
        .filter(|e| e.error.is_none())
        .filter_map(|e| {
            let eid = e.eid.as_deref().and_then(Eid::parse)?;
            let names: Vec<String> = e.author.into_iter().filter_map(|a| a.authname).collect();
            Some(DocumentSummary {
                eid,
                title: e.title,
                cover_date: e.cover_date.as_deref().and_then(CoverDate::parse),
                author_count: e.author_count.map(|n| n as usize),
                author_names: (!names.is_empty()).then(|| names.join(";")),
                keywords: e.authkeywords,
            })
        })
        .collect();
    Ok(SearchPage {
        total: results.total.unwrap_or(0) as usize,
        documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
      "abstracts-retrieval-response": {
        "coredata": {
          "eid": "2-s2.0-85000000001",
          "dc:title": "Connectome-based prediction",
          "prism:publicationName": "NeuroImage",
          "prism:coverDate": "2020-05-00",
          "subtypeDescription": "Article"
        },
        "authors": {"author": [
          {"@auid": "100", "ce:indexed-name": "Rosenblatt M.", "ce:surname": "Rosenblatt",
           "ce:given-name": "Matthew", "affiliation": {"@id": "60000001"}},
          {"@auid": "200", "ce:indexed-name": "Scheinost D.",
           "preferred-name": {"ce:surname": "Scheinost", "ce:given-name": "Dustin"},
           "affiliation": [{"@id": "60000002"}, {"@id": "60000003"}]}
        ]},
        "item": {"bibrecord": {"tail": {"bibliography": {"@refcount": "2", "reference": [
          {"@id": "1", "ref-info": {
            "ref-title": {"ref-titletext": "Prior work"},
            "refd-itemidlist": {"itemid": [{"$": "123", "@idtype": "SGR"}, {"$": "10.1/x", "@idtype": "DOI"}]},
            "ref-authors": {"author": [{"ce:indexed-name": "Noble S.", "ce:surname": "Noble", "ce:initials": "S."}]},
            "ref-sourcetitle": "Brain",
            "ref-publicationyear": {"@first": "2019"}
          }},
          {"@id": "2", "ref-info": {
            "refd-itemidlist": {"itemid": {"$": "456", "@idtype": "SGR"}}
          }}
        ]}}}}
      }
    }"#;

    #[test]
    fn full_view_core_and_authors() {
        let ab = parse_abstract(FULL, &Eid::from_scopus_id("85000000001")).unwrap();
        assert_eq!(ab.title.as_deref(), Some("Connectome-based prediction"));
        assert_eq!(ab.cover_date, CoverDate::from_ymd(2020, 5, 1));
        assert_eq!(ab.authors.len(), 2);
        assert_eq!(ab.authors[0].auid, Some(AuthorId(100)));
        assert_eq!(ab.authors[1].surname.as_deref(), Some("Scheinost"));
        assert_eq!(ab.authors[1].affiliation_ids, vec!["60000002", "60000003"]);
    }

    #[test]
    fn full_view_references() {
        let ab = parse_abstract(FULL, &Eid::from_scopus_id("85000000001")).unwrap();
        let refs = ab.references.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].scopus_id.as_deref(), Some("123"));
        assert_eq!(refs[0].authors_raw.as_deref(), Some("Noble, S."));
        assert_eq!(refs[0].publication_year, Some(2019));
        assert_eq!(refs[1].scopus_id.as_deref(), Some("456"));
        assert_eq!(refs[1].authors_raw, None);
        assert_eq!(refs[1].eid().unwrap().as_str(), "2-s2.0-456");
    }

    #[test]
    fn missing_bibliography_is_none() {
        let body = r#"{"abstracts-retrieval-response": {"coredata": {"dc:title": "x"}, "item": {"bibrecord": {"tail": null}}}}"#;
        let eid = Eid::from_scopus_id("9");
        let ab = parse_abstract(body, &eid).unwrap();
        assert_eq!(ab.eid, eid);
        assert!(ab.references.is_none());
    }

    #[test]
    fn ref_view_entries() {
        let body = r#"{"abstracts-retrieval-response": {"references": {
            "@total-references": "1",
            "reference": {"scopus-id": "123", "title": "Prior work", "prism:coverDate": "2019-01-01",
              "author-list": {"author": [
                {"@auid": "200", "ce:surname": "Scheinost", "ce:given-name": "Dustin"},
                {"ce:surname": "Noble", "ce:initials": "S."}
              ]}}
        }}}"#;
        let view = parse_ref_view(body, &Eid::from_scopus_id("1")).unwrap();
        assert_eq!(view.total, Some(1));
        let entry = view.find("123").unwrap();
        assert_eq!(entry.author_ids(), vec![AuthorId(200)]);
        assert_eq!(entry.authors[1].initials.as_deref(), Some("S."));
    }

    #[test]
    fn author_response_as_array() {
        let body = r#"{"author-retrieval-response": [{"author-profile": {
            "preferred-name": {"surname": "Noble", "given-name": "Stephanie", "indexed-name": "Noble S."},
            "publication-range": {"@start": "2016", "@end": "2024"}
        }}]}"#;
        let p = parse_author(body, AuthorId(7)).unwrap();
        assert_eq!(p.given_name.as_deref(), Some("Stephanie"));
        assert_eq!(p.publication_range, Some((2016, 2024)));
    }

    #[test]
    fn empty_author_response_is_not_found() {
        let err = parse_author(r#"{"author-retrieval-response": []}"#, AuthorId(7)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn affiliation_fields() {
        let body = r#"{"affiliation-retrieval-response": {"affiliation-name": "Yale University", "country": "United States"}}"#;
        let a = parse_affiliation(body, "60000001").unwrap();
        assert_eq!(a.country.as_deref(), Some("United States"));
    }

    #[test]
    fn search_page_skips_error_entry() {
        let body = r#"{"search-results": {"opensearch:totalResults": "0",
            "entry": [{"@_fa": "true", "error": "Result set was empty"}]}}"#;
        let page = parse_search_page(body, "q").unwrap();
        assert_eq!(page.total, 0);
        assert!(page.documents.is_empty());
    }

    #[test]
    fn search_page_documents() {
        let body = r#"{"search-results": {"opensearch:totalResults": "1", "entry": [{
            "eid": "2-s2.0-5", "dc:title": "T", "prism:coverDate": "2021-03-04",
            "author-count": {"@limit": "100", "$": "3"},
            "author": [{"authname": "Noble S."}, {"authname": "Doe J."}],
            "authkeywords": "fMRI | connectome"
        }]}}"#;
        let page = parse_search_page(body, "q").unwrap();
        let doc = &page.documents[0];
        assert_eq!(doc.author_count, Some(3));
        assert_eq!(doc.author_names.as_deref(), Some("Noble S.;Doe J."));
        assert_eq!(doc.keywords.as_deref(), Some("fMRI | connectome"));
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = parse_abstract("<html>", &Eid::from_scopus_id("1")).unwrap_err();
        assert!(matches!(err, ScopusError::Decode { .. }));
    }
}
