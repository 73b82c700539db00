//! Scopus REST client with a response cache.

use std::path::PathBuf;

use selfcite_core::get_text;
use selfcite_match::AuthorId;

use crate::cache::ResponseCache;
use crate::error::ScopusError;
use crate::schema::{self, SearchPage};
use crate::source::ScopusSource;
use crate::types::{Abstract, Affiliation, AuthorProfile, DocumentSummary, Eid, RefView};

pub const DEFAULT_API_URL: &str = "https://api.elsevier.com";

/// Results per Scopus Search page (API maximum for COMPLETE view)
const SEARCH_PAGE_SIZE: usize = 25;

/// Scopus Search refuses `start` beyond this offset
const SEARCH_MAX_RESULTS: usize = 5000;

/// Connection settings for the Scopus APIs.
#[derive(Debug, Clone)]
pub struct ScopusConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub inst_token: Option<String>,
    /// `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub refresh_days: u32,
}

impl Default for ScopusConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            inst_token: None,
            cache_dir: None,
            refresh_days: 30,
        }
    }
}

/// HTTP implementation of [`ScopusSource`].
#[derive(Debug)]
pub struct ScopusClient {
    base: String,
    api_key: String,
    inst_token: Option<String>,
    cache: Option<ResponseCache>,
}

impl ScopusClient {
    pub fn new(config: ScopusConfig) -> Result<Self, ScopusError> {
        let api_key = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ScopusError::Config("no Scopus API key configured".into()))?;
        let cache = config
            .cache_dir
            .map(|dir| ResponseCache::new(dir, config.refresh_days));
        if let Some(cache) = &cache {
            log::debug!("Scopus cache at {}", cache.root().display());
        }
        Ok(Self {
            base: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            inst_token: config.inst_token.filter(|t| !t.trim().is_empty()),
            cache,
        })
    }

    /// Fetch through the cache. `kind`/`view`/`id` name the cache entry.
    fn fetch(&self, kind: &str, view: &str, id: &str, url: &str) -> Result<String, ScopusError> {
        if let Some(body) = self.cache.as_ref().and_then(|c| c.get(kind, view, id)) {
            return Ok(body);
        }

        let mut headers = vec![
            ("X-ELS-APIKey", self.api_key.as_str()),
            ("Accept", "application/json"),
        ];
        if let Some(token) = &self.inst_token {
            headers.push(("X-ELS-Insttoken", token.as_str()));
        }
        log::debug!("GET {kind}/{view} {id}");
        let body = get_text(url, &headers).map_err(|e| ScopusError::from_http(id, e))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(kind, view, id, &body) {
                log::warn!("cache write failed for {kind}/{id}: {e}");
            }
        }
        Ok(body)
    }

    fn abstract_url(&self, eid: &Eid, view: &str) -> String {
        format!("{}/content/abstract/eid/{}?view={view}", self.base, eid)
    }

    fn search_url(&self, query: &str, start: usize) -> String {
        format!(
            "{}/content/search/scopus?query={}&view=COMPLETE&count={SEARCH_PAGE_SIZE}&start={start}&sort=-coverDate",
            self.base,
            urlencoding::encode(query)
        )
    }

    fn search_page(&self, auid: AuthorId, start: usize) -> Result<SearchPage, ScopusError> {
        let query = format!("AU-ID({auid})");
        let url = self.search_url(&query, start);
        let id = format!("{auid}-{start}");
        let body = self.fetch("search", "COMPLETE", &id, &url)?;
        schema::parse_search_page(&body, &query)
    }
}

impl ScopusSource for ScopusClient {
    fn abstract_full(&self, eid: &Eid) -> Result<Abstract, ScopusError> {
        let body = self.fetch("abstract", "FULL", eid.as_str(), &self.abstract_url(eid, "FULL"))?;
        schema::parse_abstract(&body, eid)
    }

    fn abstract_refs(&self, eid: &Eid) -> Result<RefView, ScopusError> {
        let body = self.fetch("abstract", "REF", eid.as_str(), &self.abstract_url(eid, "REF"))?;
        schema::parse_ref_view(&body, eid)
    }

    fn author(&self, auid: AuthorId) -> Result<AuthorProfile, ScopusError> {
        let id = auid.to_string();
        let url = format!("{}/content/author/author_id/{id}?view=ENHANCED", self.base);
        let body = self.fetch("author", "ENHANCED", &id, &url)?;
        schema::parse_author(&body, auid)
    }

    fn author_documents(&self, auid: AuthorId) -> Result<Vec<DocumentSummary>, ScopusError> {
        let first = self.search_page(auid, 0)?;
        let total = first.total.min(SEARCH_MAX_RESULTS);
        let mut documents = first.documents;
        let mut start = SEARCH_PAGE_SIZE;
        while start < total {
            let page = self.search_page(auid, start)?;
            if page.documents.is_empty() {
                break;
            }
            documents.extend(page.documents);
            start += SEARCH_PAGE_SIZE;
        }
        log::debug!("author {auid}: {} documents", documents.len());
        Ok(documents)
    }

    fn affiliation(&self, id: &str) -> Result<Affiliation, ScopusError> {
        let url = format!("{}/content/affiliation/affiliation_id/{id}", self.base);
        let body = self.fetch("affiliation", "STANDARD", id, &url)?;
        schema::parse_affiliation(&body, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(cache_dir: Option<PathBuf>) -> ScopusClient {
        ScopusClient::new(ScopusConfig {
            api_key: Some("k".into()),
            api_url: "http://localhost:1/".into(),
            cache_dir,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = ScopusClient::new(ScopusConfig::default()).unwrap_err();
        assert!(matches!(err, ScopusError::Config(_)));
        let blank = ScopusConfig {
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(ScopusClient::new(blank).is_err());
    }

    #[test]
    fn abstract_url_shape() {
        let c = client(None);
        let eid = Eid::from_scopus_id("42");
        assert_eq!(
            c.abstract_url(&eid, "REF"),
            "http://localhost:1/content/abstract/eid/2-s2.0-42?view=REF"
        );
    }

    #[test]
    fn search_url_encodes_query() {
        let c = client(None);
        assert_eq!(
            c.search_url("AU-ID(7)", 25),
            "http://localhost:1/content/search/scopus?query=AU-ID%287%29&view=COMPLETE&count=25&start=25&sort=-coverDate"
        );
    }

    #[test]
    fn cached_response_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let c = client(Some(dir.path().to_path_buf()));
        let body = r#"{"affiliation-retrieval-response": {"affiliation-name": "Yale", "country": "United States"}}"#;
        ResponseCache::new(dir.path(), 30)
            .put("affiliation", "STANDARD", "60000001", body)
            .unwrap();
        let aff = c.affiliation("60000001").unwrap();
        assert_eq!(aff.name.as_deref(), Some("Yale"));
    }

    #[test]
    #[ignore = "requires network and SCOPUS_API_KEY"]
    fn live_abstract() {
        let key = std::env::var("SCOPUS_API_KEY").unwrap();
        let c = ScopusClient::new(ScopusConfig {
            api_key: Some(key),
            ..Default::default()
        })
        .unwrap();
        let ab = c.abstract_full(&Eid::from_scopus_id("85085763458")).unwrap();
        assert!(!ab.authors.is_empty());
    }
}
