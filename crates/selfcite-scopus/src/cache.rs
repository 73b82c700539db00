//! On-disk cache of raw Scopus responses.
//!
//! Layout: `<root>/<kind>/<view>/<id>.json`. An entry is reused while its
//! modification time is younger than `max_age`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Raw response cache keyed by API kind, view and record id.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>, refresh_days: u32) -> Self {
        Self {
            root: root.into(),
            max_age: Duration::from_secs(u64::from(refresh_days) * 24 * 3600),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: &str, view: &str, id: &str) -> PathBuf {
        self.root
            .join(kind)
            .join(view)
            .join(format!("{}.json", sanitize(id)))
    }

    /// Cached body if present and fresh.
    pub fn get(&self, kind: &str, view: &str, id: &str) -> Option<String> {
        let path = self.path_for(kind, view, id);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.max_age {
            log::debug!("cache: stale {}", path.display());
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(body) => Some(body),
            Err(e) => {
                log::debug!("cache: unreadable {}: {e}", path.display());
                None
            }
        }
    }

    /// Store a body, writing to a `.tmp` file first and renaming into place.
    pub fn put(&self, kind: &str, view: &str, id: &str, body: &str) -> io::Result<()> {
        let path = self.path_for(kind, view, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)
    }
}

/// Keep ids usable as file names.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 30);
        assert_eq!(cache.get("abstract", "FULL", "2-s2.0-1"), None);
        cache.put("abstract", "FULL", "2-s2.0-1", "{}").unwrap();
        assert_eq!(cache.get("abstract", "FULL", "2-s2.0-1").as_deref(), Some("{}"));
        assert!(dir.path().join("abstract/FULL/2-s2.0-1.json").exists());
    }

    #[test]
    fn views_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 30);
        cache.put("abstract", "FULL", "x", "full").unwrap();
        assert_eq!(cache.get("abstract", "REF", "x"), None);
    }

    #[test]
    fn zero_refresh_days_always_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 0);
        cache.put("author", "ENHANCED", "7", "{}").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("author", "ENHANCED", "7"), None);
    }

    #[test]
    fn ids_are_sanitized() {
        let cache = ResponseCache::new("/c", 1);
        let path = cache.path_for("search", "COMPLETE", "AU-ID(7)/p0");
        assert_eq!(path, PathBuf::from("/c/search/COMPLETE/AU-ID_7__p0.json"));
    }
}
