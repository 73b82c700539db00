//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for selfcite
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub scopus: ScopusSection,
    pub http: HttpSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopusSection {
    pub api_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub inst_token: Option<String>,
    /// Cached responses older than this are fetched again
    pub refresh_days: u32,
    pub cache_dir: Option<PathBuf>,
}

impl Default for ScopusSection {
    fn default() -> Self {
        Self {
            api_url: selfcite_scopus::client::DEFAULT_API_URL.to_string(),
            api_key: std::env::var("SCOPUS_API_KEY").ok(),
            inst_token: std::env::var("SCOPUS_INST_TOKEN").ok(),
            refresh_days: 30,
            cache_dir: directories::ProjectDirs::from("", "", "selfcite")
                .map(|dirs| dirs.cache_dir().join("scopus")),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Whole-request timeout in seconds
    pub timeout: u64,
    /// 0 skips a failed record without retrying
    pub max_retries: u32,
    pub min_interval_ms: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout: 60,
            max_retries: 0,
            min_interval_ms: 120,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand every `${VAR}` in `s`; `None` when a referenced variable is unset.
fn expand_env_var(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&std::env::var(&rest[start + 2..start + len]).ok()?);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Some(out)
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./selfcite.toml (current directory)
    /// 2. ~/.config/selfcite/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("selfcite.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "selfcite") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn scopus_config(&self) -> selfcite_scopus::ScopusConfig {
        selfcite_scopus::ScopusConfig {
            api_url: self.scopus.api_url.clone(),
            api_key: self.scopus.api_key.clone(),
            inst_token: self.scopus.inst_token.clone(),
            cache_dir: self.scopus.cache_dir.clone(),
            refresh_days: self.scopus.refresh_days,
        }
    }

    /// HTTP settings with command-line overrides applied.
    pub fn http_config(
        &self,
        timeout: Option<u64>,
        max_retries: Option<u32>,
        min_interval_ms: Option<u64>,
    ) -> selfcite_core::HttpConfig {
        selfcite_core::HttpConfig {
            timeout: Duration::from_secs(timeout.unwrap_or(self.http.timeout)),
            max_retries: max_retries.unwrap_or(self.http.max_retries),
            min_interval: Duration::from_millis(min_interval_ms.unwrap_or(self.http.min_interval_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("./data"));
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.scopus.refresh_days, 30);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("SELFCITE_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${SELFCITE_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("SELFCITE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_embedded() {
        std::env::set_var("SELFCITE_TEST_TOKEN", "t0k");
        assert_eq!(
            expand_env_var("inst-${SELFCITE_TEST_TOKEN}-x"),
            Some("inst-t0k-x".to_string())
        );
        assert_eq!(expand_env_var("open ${brace"), Some("open ${brace".to_string()));
        std::env::remove_var("SELFCITE_TEST_TOKEN");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
default_dir = "/tmp/data"

[scopus]
api_key = "abc"
refresh_days = 7
cache_dir = "/tmp/cache"

[http]
max_retries = 3
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.scopus.api_key.as_deref(), Some("abc"));
        assert_eq!(config.scopus.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.http.timeout, 60);

        let scopus = config.scopus_config();
        assert_eq!(scopus.refresh_days, 7);
    }

    #[test]
    fn cli_overrides_http_settings() {
        let config = Config::default();
        let http = config.http_config(Some(5), None, Some(0));
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.max_retries, 0);
        assert_eq!(http.min_interval, Duration::ZERO);
    }
}
