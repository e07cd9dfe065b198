//! Reqwest-backed document store for the hosted document database.
//!
//! Writes are `PATCH` requests of typed documents. Subscriptions poll the
//! document on a tokio task and push whenever the observed snapshot differs
//! from the previous one; the first poll always pushes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use url::Url;

use super::dto::{decode_document, encode_document, error_message};
use super::session::RestSession;
use super::{body_preview, join_segments};
use crate::domain::ports::{
    DocumentFields, DocumentHandler, DocumentSnapshot, DocumentStore, DocumentStoreError,
    Subscription,
};

const DEFAULT_DATABASE: &str = "(default)";

/// Document store speaking the `v1/projects/*/databases/*/documents` API.
pub struct RestDocumentStore {
    client: Client,
    base_url: Url,
    project_id: String,
    session: Arc<RestSession>,
    poll_interval: Duration,
}

impl RestDocumentStore {
    pub(crate) fn new(
        client: Client,
        base_url: Url,
        project_id: String,
        session: Arc<RestSession>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            base_url,
            project_id,
            session,
            poll_interval,
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, DocumentStoreError> {
        join_segments(
            &self.base_url,
            &[
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                DEFAULT_DATABASE,
                "documents",
                collection,
                id,
            ],
        )
        .ok_or_else(|| DocumentStoreError::transport("documents base URL cannot be joined"))
    }

    /// Read `collection/id` once.
    pub async fn fetch_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<DocumentSnapshot, DocumentStoreError> {
        let url = self.document_url(collection, id)?;
        fetch(&self.client, &self.session, url).await
    }
}

fn authorised(request: RequestBuilder, session: &RestSession) -> RequestBuilder {
    match session.id_token() {
        Some(token) => request.bearer_auth(token.as_str()),
        None => request,
    }
}

async fn fetch(
    client: &Client,
    session: &RestSession,
    url: Url,
) -> Result<DocumentSnapshot, DocumentStoreError> {
    let response = authorised(client.get(url), session)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if status == StatusCode::NOT_FOUND {
        return Ok(DocumentSnapshot::absent());
    }
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    decode_document(body.as_ref())
        .map(DocumentSnapshot::present)
        .map_err(DocumentStoreError::decode)
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> Result<(), DocumentStoreError> {
        let url = self.document_url(collection, id)?;
        let response = authorised(self.client.patch(url), &self.session)
            .json(&encode_document(fields))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_transport_error)?;
            return Err(map_status_error(status, body.as_ref()));
        }
        debug!(collection, id, "document written");
        Ok(())
    }

    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
        handler: DocumentHandler,
    ) -> Subscription {
        let url = match self.document_url(collection, id) {
            Ok(url) => url,
            Err(error) => {
                handler(Err(error));
                return Subscription::inert();
            }
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(collection, id, "document subscription needs a tokio runtime");
            handler(Err(DocumentStoreError::transport(
                "no async runtime available for polling",
            )));
            return Subscription::inert();
        };

        let client = self.client.clone();
        let session = Arc::clone(&self.session);
        let poll_interval = self.poll_interval;
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Result<DocumentSnapshot, DocumentStoreError>> = None;
            loop {
                ticker.tick().await;
                let result = fetch(&client, &session, url.clone()).await;
                if last.as_ref() != Some(&result) {
                    handler(result.clone());
                    last = Some(result);
                }
            }
        });
        Subscription::new(move || task.abort())
    }
}

fn map_transport_error(error: reqwest::Error) -> DocumentStoreError {
    DocumentStoreError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> DocumentStoreError {
    let message = error_message(body)
        .unwrap_or_else(|| format!("status {}: {}", status.as_u16(), body_preview(body)));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DocumentStoreError::permission_denied(message)
        }
        _ => DocumentStoreError::transport(message),
    }
}
