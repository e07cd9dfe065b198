//! In-memory backend implementing both the identity and document ports.
//!
//! Accounts, the signed-in identity and documents live behind one mutex.
//! Callbacks are always invoked after that mutex is released, and every
//! registration is counted so tests can assert that nothing leaks.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::listeners::{IdentityListener, ListenerRegistry};
use crate::domain::IdentityId;
use crate::domain::ports::{
    DocumentFields, DocumentHandler, DocumentSnapshot, DocumentStore, DocumentStoreError,
    IdentityChangeHandler, IdentityGateway, IdentityGatewayError, Subscription,
};

const MIN_PASSWORD_CHARS: usize = 6;

/// Operations whose next call can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BackendOperation {
    CreateAccount,
    SignIn,
    SendReset,
    SignOut,
    WriteDocument,
}

struct Account {
    identity: IdentityId,
    password: Zeroizing<String>,
}

#[derive(Default)]
struct BackendState {
    accounts: BTreeMap<String, Account>,
    current: Option<IdentityId>,
    documents: BTreeMap<(String, String), DocumentFields>,
    reset_requests: Vec<String>,
    failing: BTreeSet<BackendOperation>,
}

impl BackendState {
    fn take_failure(&mut self, operation: BackendOperation) -> bool {
        self.failing.remove(&operation)
    }

    fn snapshot(&self, collection: &str, id: &str) -> DocumentSnapshot {
        self.documents
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
            .map_or_else(DocumentSnapshot::absent, DocumentSnapshot::present)
    }

    /// Swap the signed-in identity, returning it when it changed.
    fn switch_identity(&mut self, next: Option<IdentityId>) -> Option<Option<IdentityId>> {
        if self.current == next {
            return None;
        }
        self.current.clone_from(&next);
        Some(next)
    }
}

struct DocumentWatch {
    collection: String,
    id: String,
    handler: DocumentHandler,
}

impl DocumentWatch {
    fn matches(&self, collection: &str, id: &str) -> bool {
        self.collection == collection && self.id == id
    }
}

/// Backend kept entirely in process memory.
///
/// Clones share the same accounts, documents and listeners.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    identity_listeners: ListenerRegistry<IdentityListener>,
    document_listeners: ListenerRegistry<DocumentWatch>,
}

impl InMemoryBackend {
    /// Empty backend with no accounts and nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account without signing it in.
    ///
    /// # Errors
    ///
    /// Fails with the same rejections as account creation through the port.
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        let mut state = self.state();
        insert_account(&mut state, email, password)
    }

    /// Make the next call to `operation` fail with a transport error.
    pub fn fail_next(&self, operation: BackendOperation) {
        self.state().failing.insert(operation);
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> usize {
        self.state().accounts.len()
    }

    /// Identity currently signed in.
    pub fn current_identity(&self) -> Option<IdentityId> {
        self.state().current.clone()
    }

    /// Drop the session as if the token had expired.
    pub fn expire_session(&self) {
        let changed = self.state().switch_identity(None);
        if let Some(identity) = changed {
            self.notify_identity(identity);
        }
    }

    /// Stored body of `collection/id`.
    pub fn document(&self, collection: &str, id: &str) -> Option<DocumentFields> {
        self.state()
            .documents
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
    }

    /// Store a document directly and notify its subscribers.
    pub fn put_document(&self, collection: &str, id: &str, fields: DocumentFields) {
        self.state()
            .documents
            .insert((collection.to_owned(), id.to_owned()), fields.clone());
        self.notify_document(collection, id, &Ok(DocumentSnapshot::present(fields)));
    }

    /// Remove a document and notify its subscribers.
    pub fn delete_document(&self, collection: &str, id: &str) {
        self.state()
            .documents
            .remove(&(collection.to_owned(), id.to_owned()));
        self.notify_document(collection, id, &Ok(DocumentSnapshot::absent()));
    }

    /// Deliver `error` to every subscriber of `collection/id`.
    pub fn push_document_error(&self, collection: &str, id: &str, error: DocumentStoreError) {
        self.notify_document(collection, id, &Err(error));
    }

    /// Emails for which a reset was requested, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.state().reset_requests.clone()
    }

    /// Live identity-change registrations.
    pub fn active_identity_subscriptions(&self) -> usize {
        self.identity_listeners.len()
    }

    /// Live document registrations.
    pub fn active_document_subscriptions(&self) -> usize {
        self.document_listeners.len()
    }

    /// All live registrations.
    pub fn active_subscriptions(&self) -> usize {
        self.active_identity_subscriptions() + self.active_document_subscriptions()
    }

    fn notify_identity(&self, identity: Option<IdentityId>) {
        for listener in self.identity_listeners.listeners() {
            listener(identity.clone());
        }
    }

    fn notify_document(
        &self,
        collection: &str,
        id: &str,
        result: &Result<DocumentSnapshot, DocumentStoreError>,
    ) {
        for watch in self.document_listeners.listeners() {
            if watch.matches(collection, id) {
                (watch.handler)(result.clone());
            }
        }
    }

    fn sign_in_as(&self, identity: IdentityId) {
        let changed = self.state().switch_identity(Some(identity));
        if let Some(identity) = changed {
            self.notify_identity(identity);
        }
    }
}

fn insert_account(
    state: &mut BackendState,
    email: &str,
    password: &str,
) -> Result<IdentityId, IdentityGatewayError> {
    if email.is_empty() {
        return Err(IdentityGatewayError::rejected("MISSING_EMAIL"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(IdentityGatewayError::rejected(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ));
    }
    if state.accounts.contains_key(email) {
        return Err(IdentityGatewayError::rejected("EMAIL_EXISTS"));
    }
    let identity = IdentityId::new(Uuid::new_v4().simple().to_string())
        .map_err(|error| IdentityGatewayError::decode(error.to_string()))?;
    state.accounts.insert(
        email.to_owned(),
        Account {
            identity: identity.clone(),
            password: Zeroizing::new(password.to_owned()),
        },
    );
    Ok(identity)
}

fn injected() -> IdentityGatewayError {
    IdentityGatewayError::transport("injected failure")
}

#[async_trait]
impl IdentityGateway for InMemoryBackend {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        let identity = {
            let mut state = self.state();
            if state.take_failure(BackendOperation::CreateAccount) {
                return Err(injected());
            }
            insert_account(&mut state, email, password)?
        };
        debug!(identity = %identity, "in-memory account created");
        self.sign_in_as(identity.clone());
        Ok(identity)
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        let identity = {
            let mut state = self.state();
            if state.take_failure(BackendOperation::SignIn) {
                return Err(injected());
            }
            if password.is_empty() {
                return Err(IdentityGatewayError::rejected("MISSING_PASSWORD"));
            }
            match state.accounts.get(email) {
                Some(account) if account.password.as_str() == password => account.identity.clone(),
                _ => return Err(IdentityGatewayError::rejected("INVALID_LOGIN_CREDENTIALS")),
            }
        };
        self.sign_in_as(identity.clone());
        Ok(identity)
    }

    async fn send_reset(&self, email: &str) -> Result<(), IdentityGatewayError> {
        let mut state = self.state();
        if state.take_failure(BackendOperation::SendReset) {
            return Err(injected());
        }
        if !state.accounts.contains_key(email) {
            return Err(IdentityGatewayError::rejected("EMAIL_NOT_FOUND"));
        }
        state.reset_requests.push(email.to_owned());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        let changed = {
            let mut state = self.state();
            if state.take_failure(BackendOperation::SignOut) {
                return Err(injected());
            }
            state.switch_identity(None)
        };
        if let Some(identity) = changed {
            self.notify_identity(identity);
        }
        Ok(())
    }

    fn on_identity_change(&self, handler: IdentityChangeHandler) -> Subscription {
        let handler: Arc<IdentityListener> = Arc::from(handler);
        let subscription = self.identity_listeners.register(Arc::clone(&handler));
        let current = self.current_identity();
        handler(current);
        subscription
    }
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> Result<(), DocumentStoreError> {
        {
            let mut state = self.state();
            if state.take_failure(BackendOperation::WriteDocument) {
                return Err(DocumentStoreError::transport("injected failure"));
            }
            state
                .documents
                .insert((collection.to_owned(), id.to_owned()), fields.clone());
        }
        self.notify_document(
            collection,
            id,
            &Ok(DocumentSnapshot::present(fields.clone())),
        );
        Ok(())
    }

    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
        handler: DocumentHandler,
    ) -> Subscription {
        let watch = Arc::new(DocumentWatch {
            collection: collection.to_owned(),
            id: id.to_owned(),
            handler,
        });
        let subscription = self.document_listeners.register(Arc::clone(&watch));
        let snapshot = self.state().snapshot(collection, id);
        (watch.handler)(Ok(snapshot));
        subscription
    }
}
