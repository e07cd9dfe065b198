//! REST adapters for the hosted identity toolkit and document database.
//!
//! Both adapters share one reqwest client and one session, so the bearer
//! token obtained at sign-in authorises later document calls.

mod config;
mod documents;
mod dto;
mod identity;
mod session;

use std::sync::Arc;

use reqwest::Client;
use url::Url;

pub use config::{BackendSettings, ConfigError, RestBackendConfig};
pub use documents::RestDocumentStore;
pub use identity::RestIdentityGateway;
use session::RestSession;

/// Identity gateway and document store bound to one hosted project.
pub struct RestBackend {
    pub identity: Arc<RestIdentityGateway>,
    pub documents: Arc<RestDocumentStore>,
}

impl RestBackend {
    /// Build both adapters from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn connect(config: &RestBackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let session = Arc::new(RestSession::default());
        let identity = RestIdentityGateway::new(
            client.clone(),
            config.identity_base_url().clone(),
            config.api_key().to_owned(),
            Arc::clone(&session),
        );
        let documents = RestDocumentStore::new(
            client,
            config.documents_base_url().clone(),
            config.project_id().to_owned(),
            session,
            config.poll_interval(),
        );
        Ok(Self {
            identity: Arc::new(identity),
            documents: Arc::new(documents),
        })
    }
}

/// Append path segments to `base`, dropping a trailing empty segment first.
fn join_segments(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
