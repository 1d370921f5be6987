//! Configuration parsing and validation.
//!
//! Throttler configuration is a JSON file; every field has a default so an
//! empty object (or no file at all) yields the built-in deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::{CachePolicy, DEFAULT_CACHE_TTL};
use crate::domain::{Candidate, CandidateId};
use crate::impls::DEFAULT_PARAMS_URL;

/// Built-in candidate registry (id, base install URL).
///
/// Base URLs end with a query param so the `-{distribution}` suffix stays harmless.
pub const DEFAULT_CANDIDATES: [(&str, &str); 1] = [(
    "jid1-b6xdDZ3ld1nExQ@jetpack",
    "https://people.mozilla.org/~elee/user-profile-research.xpi?src=external-testpilot",
)];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level throttler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottlerConfig {
    /// URL of the remote gating params document.
    #[serde(default = "default_params_url")]
    pub params_url: String,

    /// Cache TTL in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Cache failed fetches as "no params" for the full TTL.
    #[serde(default = "default_cache_failed_fetches")]
    pub cache_failed_fetches: bool,

    /// HTTP connect + request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Locale override; when absent the process environment is consulted.
    #[serde(default)]
    pub locale: Option<String>,

    /// Path of the JSON state file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Seconds between idle notifications in `run` mode.
    #[serde(default = "default_idle_interval_secs")]
    pub idle_interval_secs: u64,

    /// Candidate registry.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<Candidate>,
}

fn default_params_url() -> String {
    DEFAULT_PARAMS_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

fn default_cache_failed_fetches() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_store_path() -> PathBuf {
    PathBuf::from("throttler-state.json")
}

fn default_idle_interval_secs() -> u64 {
    60 * 60 * 24
}

fn default_candidates() -> Vec<Candidate> {
    DEFAULT_CANDIDATES
        .iter()
        .map(|(id, url)| Candidate::new(*id, *url))
        .collect()
}

impl Default for ThrottlerConfig {
    fn default() -> Self {
        Self {
            params_url: default_params_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_failed_fetches: default_cache_failed_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            locale: None,
            store_path: default_store_path(),
            idle_interval_secs: default_idle_interval_secs(),
            candidates: default_candidates(),
        }
    }
}

impl ThrottlerConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.params_url.trim().is_empty() {
            return Err(ConfigError::Invalid("params_url must not be empty".to_string()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache_ttl_secs must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        if self.idle_interval_secs == 0 {
            return Err(ConfigError::Invalid("idle_interval_secs must be positive".to_string()));
        }
        if self.candidates.is_empty() {
            return Err(ConfigError::Invalid("at least one candidate is required".to_string()));
        }

        let mut seen: Vec<&CandidateId> = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            if candidate.id.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("candidate id must not be empty".to_string()));
            }
            if candidate.install_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "candidate {} has an empty install_url",
                    candidate.id
                )));
            }
            if seen.contains(&&candidate.id) {
                return Err(ConfigError::Invalid(format!("duplicate candidate {}", candidate.id)));
            }
            seen.push(&candidate.id);
        }
        Ok(())
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_failed_fetches: self.cache_failed_fetches,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_yields_defaults() {
        let config: ThrottlerConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, ThrottlerConfig::default());
        assert_eq!(config.cache_policy(), CachePolicy::default());
        assert_eq!(config.candidates.len(), 1);
        config.validate().unwrap();
    }

    #[test]
    fn load_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("throttler.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "params_url": "https://example.test/params.json",
                "cache_ttl_secs": 60,
                "cache_failed_fetches": false,
                "locale": "en-GB",
                "candidates": [{ "id": "a@test", "install_url": "https://example.test/a.xpi?src=x" }],
            }))
            .unwrap(),
        )
        .unwrap();

        let config = ThrottlerConfig::load(&path).unwrap();
        assert_eq!(config.params_url, "https://example.test/params.json");
        assert_eq!(config.locale.as_deref(), Some("en-GB"));
        assert_eq!(
            config.cache_policy(),
            CachePolicy {
                ttl: Duration::from_secs(60),
                cache_failed_fetches: false,
            }
        );
        assert_eq!(config.candidates, vec![Candidate::new("a@test", "https://example.test/a.xpi?src=x")]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ThrottlerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn rejects_duplicate_candidates() {
        let config = ThrottlerConfig {
            candidates: vec![
                Candidate::new("a@test", "https://example.test/a.xpi"),
                Candidate::new("a@test", "https://example.test/b.xpi"),
            ],
            ..ThrottlerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = ThrottlerConfig {
            cache_ttl_secs: 0,
            ..ThrottlerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
