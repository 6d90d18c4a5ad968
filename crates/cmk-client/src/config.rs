//! Client configuration.
//!
//! The console ships a `config/config.json` with the API base URL and an
//! optional `config/config.yaml` for the observability integration. Both can
//! be read from disk; `config.json` can also be fetched from the console's
//! origin. Environment variables override file values.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{API_PREFIX, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, USER_AGENT};

/// File name of the observability settings, next to `config.json`.
pub const OBSERVABILITY_FILE: &str = "config.yaml";

/// Contents of `config/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    pub api_base_url: String,
}

impl ConsoleConfig {
    /// Parse a `config.json` document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid.
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            origin: origin.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Read `config.json` from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &content)
    }

    /// Fetch `<origin>/config/config.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Fetch`] if the request fails or the server
    /// answers with an error status, [`ConfigError::Parse`] for a malformed
    /// document.
    pub async fn fetch(http: &reqwest::Client, origin: &str) -> Result<Self, ConfigError> {
        let url = format!("{}/config/config.json", origin.trim_end_matches('/'));
        let fetch_err = |reason: String| ConfigError::Fetch {
            url: url.clone(),
            reason,
        };

        let resp = http
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status.as_u16())));
        }
        let body = resp.text().await.map_err(|e| fetch_err(e.to_string()))?;
        Self::from_json(&url, &body)
    }
}

/// Opaque settings for the analytics/observability integration, read from
/// `config.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig(serde_yaml::Value);

impl ObservabilityConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid YAML.
    pub fn from_yaml(origin: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml)
            .map(Self)
            .map_err(|e| ConfigError::Parse {
                origin: origin.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Read `config.yaml` if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for read failures other than a missing
    /// file, [`ConfigError::Parse`] on invalid YAML.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&path.display().to_string(), &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Top-level setting by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_yaml::Value {
        &self.0
    }
}

/// Everything needed to build an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://kms.example.com`.
    pub base_url: String,
    /// Tenant to select at start-up.
    pub tenant_id: Option<String>,
    /// Raw `Cookie` header of the browser session (carries `CSRF-<tenant>`).
    pub cookies: String,
    /// Identity provider base for login URLs.
    pub auth_url: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Settings from the `config.yaml` beside `CMK_CONFIG_FILE`, if any.
    pub observability: Option<ObservabilityConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            tenant_id: None,
            cookies: String::new(),
            auth_url: None,
            timeout: DEFAULT_TIMEOUT,
            observability: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CMK_CONFIG_FILE`: path to a `config.json` supplying `apiBaseUrl`;
    ///   a `config.yaml` in the same directory is loaded as well
    /// - `CMK_API_BASE_URL`: backend origin (overrides the file)
    /// - `CMK_TENANT`: tenant to select at start-up
    /// - `CMK_COOKIES`: raw `Cookie` header of an authenticated session
    /// - `CMK_AUTH_URL`: identity provider base for login URLs
    /// - `CMK_TIMEOUT_SECS`: request timeout (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns an error if `CMK_CONFIG_FILE` is set but cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if `CMK_CONFIG_FILE` is set but cannot be read.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (file_base, observability) = match var("CMK_CONFIG_FILE") {
            Some(path) => {
                let path = Path::new(&path);
                let console = ConsoleConfig::from_file(path)?;
                let observability =
                    ObservabilityConfig::load(&path.with_file_name(OBSERVABILITY_FILE))?;
                (Some(console.api_base_url), observability)
            }
            None => (None, None),
        };

        let base_url = var("CMK_API_BASE_URL")
            .or(file_base)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        let timeout = var("CMK_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            base_url,
            tenant_id: var("CMK_TENANT"),
            cookies: var("CMK_COOKIES").unwrap_or_default(),
            auth_url: var("CMK_AUTH_URL"),
            timeout,
            observability,
        })
    }

    /// Take the base URL from the `config.json` served by a console origin.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::fetch`].
    pub async fn discover_base_url(&mut self, origin: &str) -> Result<(), ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::Fetch {
                url: origin.to_owned(),
                reason: e.to_string(),
            })?;
        self.base_url = ConsoleConfig::fetch(&http, origin).await?.api_base_url;
        Ok(())
    }

    /// Absolute API root, `<base_url>/cmk/v1`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] unless the base URL is an
    /// absolute `http`/`https` URL.
    pub fn api_root(&self) -> Result<String, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: reason.to_owned(),
        };
        let parsed = reqwest::Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if trimmed.ends_with(API_PREFIX) {
            return Ok(trimmed.to_owned());
        }
        Ok(format!("{trimmed}{API_PREFIX}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_variables() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.tenant_id, None);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn env_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"apiBaseUrl": "https://from-file.example.com"}}"#).unwrap();
        let path = file.path().display().to_string();

        let from_file =
            ClientConfig::from_lookup(lookup(&[("CMK_CONFIG_FILE", &path)])).unwrap();
        assert_eq!(from_file.base_url, "https://from-file.example.com");

        let overridden = ClientConfig::from_lookup(lookup(&[
            ("CMK_CONFIG_FILE", &path),
            ("CMK_API_BASE_URL", "https://env.example.com"),
            ("CMK_TENANT", "t1"),
            ("CMK_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(overridden.base_url, "https://env.example.com");
        assert_eq!(overridden.tenant_id.as_deref(), Some("t1"));
        assert_eq!(overridden.timeout, Duration::from_secs(5));
    }

    #[test]
    fn observability_is_read_beside_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"apiBaseUrl": "https://kms.example.com"}"#).unwrap();
        let path = json.display().to_string();

        let without = ClientConfig::from_lookup(lookup(&[("CMK_CONFIG_FILE", &path)])).unwrap();
        assert!(without.observability.is_none());

        std::fs::write(dir.path().join(OBSERVABILITY_FILE), "endpoint: https://o\n").unwrap();
        let with = ClientConfig::from_lookup(lookup(&[("CMK_CONFIG_FILE", &path)])).unwrap();
        let obs = with.observability.unwrap();
        assert_eq!(
            obs.get("endpoint").and_then(serde_yaml::Value::as_str),
            Some("https://o")
        );
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[(
            "CMK_CONFIG_FILE",
            "/nonexistent/config.json",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn api_root_appends_prefix_once() {
        let mut cfg = ClientConfig {
            base_url: "https://kms.example.com/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(cfg.api_root().unwrap(), "https://kms.example.com/cmk/v1");
        cfg.base_url = "https://kms.example.com/cmk/v1".into();
        assert_eq!(cfg.api_root().unwrap(), "https://kms.example.com/cmk/v1");
    }

    #[test]
    fn api_root_rejects_relative_and_non_http_urls() {
        for bad in ["kms.example.com", "ftp://kms.example.com", ""] {
            let cfg = ClientConfig {
                base_url: bad.into(),
                ..ClientConfig::default()
            };
            assert!(
                matches!(cfg.api_root(), Err(ConfigError::InvalidBaseUrl { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn console_config_requires_api_base_url() {
        assert!(ConsoleConfig::from_json("inline", "{}").is_err());
        let cfg = ConsoleConfig::from_json("inline", r#"{"apiBaseUrl":"https://x"}"#).unwrap();
        assert_eq!(cfg.api_base_url, "https://x");
    }

    #[test]
    fn observability_config_is_optional() {
        assert!(
            ObservabilityConfig::load(Path::new("/nonexistent/config.yaml"))
                .unwrap()
                .is_none()
        );
        let cfg = ObservabilityConfig::from_yaml("inline", "endpoint: https://o\nsampling: 0.5\n")
            .unwrap();
        assert_eq!(
            cfg.get("endpoint").and_then(serde_yaml::Value::as_str),
            Some("https://o")
        );
    }
}
