//! Driven port for the hosted per-user document store.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Subscription, define_port_error};

/// Schemaless document body keyed by field name.
pub type DocumentFields = Map<String, Value>;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// The store refused access to the document.
        PermissionDenied { message: String } => "document access denied: {message}",
        /// The request never completed.
        Transport { message: String } => "document store unreachable: {message}",
        /// The stored payload could not be read.
        Decode { message: String } => "document payload could not be decoded: {message}",
    }
}

/// One observation of a document: whether it exists and its fields.
///
/// `data` is empty when `exists` is false.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentSnapshot {
    /// Whether the document is present.
    pub exists: bool,
    /// Document body.
    pub data: DocumentFields,
}

impl DocumentSnapshot {
    /// Snapshot of a present document.
    pub fn present(data: DocumentFields) -> Self {
        Self { exists: true, data }
    }

    /// Snapshot of a missing document.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Callback invoked with every document push or subscription failure.
pub type DocumentHandler = Box<dyn Fn(Result<DocumentSnapshot, DocumentStoreError>) + Send + Sync>;

/// Port for writing and live-reading single documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite `collection/id` with `fields`.
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> Result<(), DocumentStoreError>;

    /// Register `handler` for pushes of `collection/id`.
    ///
    /// The handler receives the current snapshot once after subscribing and
    /// again on every change.
    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
        handler: DocumentHandler,
    ) -> Subscription;
}
