//! Hosted backend configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_DOCUMENTS_BASE_URL: &str = "https://firestore.googleapis.com";

/// Raw settings for the hosted identity and document services.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "UMAMI_BACKEND")]
pub struct BackendSettings {
    /// Web API key sent with identity requests.
    pub api_key: Option<String>,
    /// Project hosting the document database.
    pub project_id: Option<String>,
    /// Override for the identity service origin.
    pub identity_base_url: Option<String>,
    /// Override for the document service origin.
    pub documents_base_url: Option<String>,
    /// Delay between document polls, in milliseconds.
    #[ortho_config(default = 2000)]
    pub poll_interval_ms: u64,
    /// Per-request timeout, in seconds.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
}

impl BackendSettings {
    /// Return the identity service origin, falling back to the default.
    pub fn identity_base_url(&self) -> &str {
        self.identity_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IDENTITY_BASE_URL)
    }

    /// Return the document service origin, falling back to the default.
    pub fn documents_base_url(&self) -> &str {
        self.documents_base_url
            .as_deref()
            .unwrap_or(DEFAULT_DOCUMENTS_BASE_URL)
    }

    /// Return the poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Return the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Problems found while validating [`BackendSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing api key; set UMAMI_BACKEND_API_KEY")]
    MissingApiKey,
    #[error("missing project id; set UMAMI_BACKEND_PROJECT_ID")]
    MissingProjectId,
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{field} must be an http(s) origin, got {value}")]
    UnsupportedUrl { field: &'static str, value: String },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Validated settings consumed by the REST adapters.
///
/// ## Invariants
/// - API key and project id are non-blank.
/// - Both base URLs are http(s) origins that accept path segments.
/// - Poll interval and request timeout are non-zero.
#[derive(Debug, Clone)]
pub struct RestBackendConfig {
    api_key: String,
    project_id: String,
    identity_base_url: Url,
    documents_base_url: Url,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl RestBackendConfig {
    /// Validate explicit values into a config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any invariant is violated.
    pub fn new(
        api_key: &str,
        project_id: &str,
        identity_base_url: Url,
        documents_base_url: Url,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required(Some(api_key)).ok_or(ConfigError::MissingApiKey)?,
            project_id: required(Some(project_id)).ok_or(ConfigError::MissingProjectId)?,
            identity_base_url: check_origin("identity_base_url", identity_base_url)?,
            documents_base_url: check_origin("documents_base_url", documents_base_url)?,
            poll_interval: non_zero("poll_interval_ms", poll_interval)?,
            request_timeout: non_zero("request_timeout_secs", request_timeout)?,
        })
    }

    /// Web API key sent with identity requests.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Project hosting the document database.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Identity service origin.
    pub fn identity_base_url(&self) -> &Url {
        &self.identity_base_url
    }

    /// Document service origin.
    pub fn documents_base_url(&self) -> &Url {
        &self.documents_base_url
    }

    /// Delay between document polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl TryFrom<&BackendSettings> for RestBackendConfig {
    type Error = ConfigError;

    fn try_from(settings: &BackendSettings) -> Result<Self, Self::Error> {
        let api_key = settings.api_key.as_deref().unwrap_or_default();
        let project_id = settings.project_id.as_deref().unwrap_or_default();
        Self::new(
            api_key,
            project_id,
            parse_url("identity_base_url", settings.identity_base_url())?,
            parse_url("documents_base_url", settings.documents_base_url())?,
            settings.poll_interval(),
            settings.request_timeout(),
        )
    }
}

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn non_zero(field: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if value.is_zero() {
        Err(ConfigError::ZeroDuration { field })
    } else {
        Ok(value)
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}

fn check_origin(field: &'static str, url: Url) -> Result<Url, ConfigError> {
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::UnsupportedUrl {
            field,
            value: url.into(),
        });
    }
    Ok(url)
}
