//! Tests for the profile sync listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    DocumentFields, DocumentHandler, IdentityChangeHandler, IdentityGatewayError,
};

type SharedIdentityHandler = Arc<dyn Fn(Option<IdentityId>) + Send + Sync>;
type SharedDocumentHandler = Arc<dyn Fn(Result<DocumentSnapshot, DocumentStoreError>) + Send + Sync>;

fn id(raw: &str) -> IdentityId {
    IdentityId::new(raw).expect("fixture identity")
}

fn fields(body: Value) -> DocumentFields {
    match body {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

/// Gateway double that only records identity handlers.
#[derive(Clone, Default)]
struct ScriptedGateway {
    handlers: Arc<Mutex<Vec<(u64, SharedIdentityHandler)>>>,
    next_id: Arc<AtomicU64>,
}

impl ScriptedGateway {
    fn emit(&self, identity: Option<&str>) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .expect("handlers lock")
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(identity.map(id));
        }
    }

    fn active(&self) -> usize {
        self.handlers.lock().expect("handlers lock").len()
    }
}

#[async_trait]
impl IdentityGateway for ScriptedGateway {
    async fn create_account(&self, _: &str, _: &str) -> Result<IdentityId, IdentityGatewayError> {
        Err(IdentityGatewayError::transport("not scripted"))
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<IdentityId, IdentityGatewayError> {
        Err(IdentityGatewayError::transport("not scripted"))
    }

    async fn send_reset(&self, _: &str) -> Result<(), IdentityGatewayError> {
        Err(IdentityGatewayError::transport("not scripted"))
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        Err(IdentityGatewayError::transport("not scripted"))
    }

    fn on_identity_change(&self, handler: IdentityChangeHandler) -> Subscription {
        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers
            .lock()
            .expect("handlers lock")
            .push((key, Arc::from(handler)));
        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            handlers
                .lock()
                .expect("handlers lock")
                .retain(|(candidate, _)| *candidate != key);
        })
    }
}

/// Store double recording subscribe/release order per document id.
#[derive(Clone, Default)]
struct ScriptedStore {
    handlers: Arc<Mutex<Vec<(u64, String, SharedDocumentHandler)>>>,
    log: Arc<Mutex<Vec<String>>>,
    next_id: Arc<AtomicU64>,
    initial: Arc<Mutex<Option<DocumentSnapshot>>>,
}

impl ScriptedStore {
    fn with_initial(snapshot: DocumentSnapshot) -> Self {
        let store = Self::default();
        *store.initial.lock().expect("initial lock") = Some(snapshot);
        store
    }

    fn emit(&self, doc_id: &str, result: Result<DocumentSnapshot, DocumentStoreError>) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .expect("handlers lock")
            .iter()
            .filter(|(_, candidate, _)| candidate == doc_id)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(result.clone());
        }
    }

    fn active(&self) -> usize {
        self.handlers.lock().expect("handlers lock").len()
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn write_document(
        &self,
        _: &str,
        _: &str,
        _: &DocumentFields,
    ) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::transport("not scripted"))
    }

    fn subscribe_document(
        &self,
        collection: &str,
        doc_id: &str,
        handler: DocumentHandler,
    ) -> Subscription {
        assert_eq!(collection, "users");
        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handler: SharedDocumentHandler = Arc::from(handler);
        self.handlers.lock().expect("handlers lock").push((
            key,
            doc_id.to_owned(),
            Arc::clone(&handler),
        ));
        self.log
            .lock()
            .expect("log lock")
            .push(format!("subscribe {doc_id}"));
        if let Some(snapshot) = self.initial.lock().expect("initial lock").clone() {
            handler(Ok(snapshot));
        }

        let handlers = Arc::clone(&self.handlers);
        let log = Arc::clone(&self.log);
        let doc_id = doc_id.to_owned();
        Subscription::new(move || {
            handlers
                .lock()
                .expect("handlers lock")
                .retain(|(candidate, _, _)| *candidate != key);
            log.lock()
                .expect("log lock")
                .push(format!("release {doc_id}"));
        })
    }
}

type Listener = ProfileSyncListener<ScriptedGateway, ScriptedStore>;

struct Harness {
    gateway: ScriptedGateway,
    store: ScriptedStore,
    listener: Listener,
}

fn harness_with(store: ScriptedStore) -> Harness {
    let gateway = ScriptedGateway::default();
    let listener = ProfileSyncListener::new(Arc::new(gateway.clone()), Arc::new(store.clone()));
    Harness {
        gateway,
        store,
        listener,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(ScriptedStore::default())
}

fn ada_profile() -> DocumentSnapshot {
    DocumentSnapshot::present(fields(json!({ "name": "Ada", "username": "ada" })))
}

#[rstest]
fn starts_unauthenticated_without_subscriptions(harness: Harness) {
    assert_eq!(harness.listener.state(), &ProfileState::Unauthenticated);
    assert_eq!(harness.listener.held_subscriptions(), 0);
    assert_eq!(harness.gateway.active(), 0);
}

#[rstest]
fn start_is_idempotent(mut harness: Harness) {
    harness.listener.start();
    harness.listener.start();
    assert_eq!(harness.gateway.active(), 1);
    assert!(harness.listener.is_running());
}

#[rstest]
fn identity_then_document_push_exposes_profile_name(mut harness: Harness) {
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.listener.drain_pending();
    assert_eq!(
        harness.listener.state(),
        &ProfileState::AuthenticatedLoading { identity: id("uid-a") }
    );
    assert_eq!(harness.store.log(), vec!["subscribe uid-a"]);

    harness.store.emit("uid-a", Ok(ada_profile()));
    harness.listener.drain_pending();
    assert_eq!(
        harness.listener.state().profile().map(ProfileDocument::name),
        Some("Ada")
    );

    harness.store.emit("uid-a", Ok(DocumentSnapshot::absent()));
    harness.listener.drain_pending();
    assert_eq!(
        harness.listener.state(),
        &ProfileState::AuthenticatedNoProfile { identity: id("uid-a") }
    );
}

#[rstest]
fn sign_out_releases_document_before_later_pushes_apply(mut harness: Harness) {
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.listener.drain_pending();

    // Both events are queued before either is applied.
    harness.gateway.emit(None);
    harness.store.emit("uid-a", Ok(ada_profile()));
    let applied = harness.listener.drain_pending();

    assert_eq!(applied, 2);
    assert_eq!(harness.listener.state(), &ProfileState::Unauthenticated);
    assert_eq!(harness.store.active(), 0);
    assert_eq!(harness.store.log(), vec!["subscribe uid-a", "release uid-a"]);
}

#[rstest]
fn switching_identity_releases_old_subscription_first(mut harness: Harness) {
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.listener.drain_pending();

    harness.gateway.emit(Some("uid-b"));
    harness.store.emit("uid-a", Ok(ada_profile()));
    harness.listener.drain_pending();

    assert_eq!(
        harness.store.log(),
        vec!["subscribe uid-a", "release uid-a", "subscribe uid-b"]
    );
    assert_eq!(
        harness.listener.state(),
        &ProfileState::AuthenticatedLoading { identity: id("uid-b") }
    );
    assert_eq!(harness.store.active(), 1);
}

#[rstest]
fn subscription_errors_leave_state_unchanged(mut harness: Harness) {
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.store.emit("uid-a", Ok(ada_profile()));
    harness.listener.drain_pending();
    let before = harness.listener.state().clone();

    harness
        .store
        .emit("uid-a", Err(DocumentStoreError::permission_denied("rules")));
    harness.listener.drain_pending();

    assert_eq!(harness.listener.state(), &before);
    assert_eq!(harness.listener.held_subscriptions(), 2);
}

#[rstest]
fn stop_releases_both_subscriptions_once(mut harness: Harness) {
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.listener.drain_pending();
    assert_eq!(harness.listener.held_subscriptions(), 2);

    harness.listener.stop();
    harness.listener.stop();

    assert_eq!(harness.gateway.active(), 0);
    assert_eq!(harness.store.active(), 0);
    assert_eq!(harness.store.log(), vec!["subscribe uid-a", "release uid-a"]);

    harness.gateway.emit(Some("uid-b"));
    assert_eq!(harness.listener.drain_pending(), 0);
}

#[rstest]
fn dropping_the_listener_releases_everything(harness: Harness) {
    let Harness {
        gateway,
        store,
        mut listener,
    } = harness;
    listener.start();
    gateway.emit(Some("uid-a"));
    listener.drain_pending();

    drop(listener);

    assert_eq!(gateway.active(), 0);
    assert_eq!(store.active(), 0);
}

#[rstest]
fn watch_receivers_observe_transitions(mut harness: Harness) {
    let watcher = harness.listener.watch();
    harness.listener.start();
    harness.gateway.emit(Some("uid-a"));
    harness.listener.drain_pending();

    assert!(watcher.has_changed().expect("sender alive"));
    assert_eq!(
        *watcher.borrow(),
        ProfileState::AuthenticatedLoading { identity: id("uid-a") }
    );
}

#[tokio::test]
async fn run_until_processes_events_and_releases_on_shutdown() {
    let Harness {
        gateway,
        store,
        mut listener,
    } = harness_with(ScriptedStore::with_initial(ada_profile()));
    let mut watcher = listener.watch();
    let emitter = gateway.clone();
    let shutdown = async move {
        emitter.emit(Some("uid-a"));
        let _loaded = watcher
            .wait_for(|state| state.profile().is_some())
            .await
            .is_ok();
    };

    tokio::time::timeout(Duration::from_secs(5), listener.run_until(shutdown))
        .await
        .expect("listener should reach the loaded profile");

    assert_eq!(
        listener.state().profile().map(ProfileDocument::name),
        Some("Ada")
    );
    assert!(!listener.is_running());
    assert_eq!(gateway.active(), 0);
    assert_eq!(store.active(), 0);
}

#[tokio::test]
async fn next_event_ends_once_the_listener_stops() {
    let Harness {
        gateway,
        mut listener,
        ..
    } = harness_with(ScriptedStore::default());
    assert!(listener.next_event().await.is_none(), "never started");

    listener.start();
    gateway.emit(Some("uid-a"));
    let state = listener.next_event().await.cloned();
    assert_eq!(
        state,
        Some(ProfileState::AuthenticatedLoading { identity: id("uid-a") })
    );

    listener.stop();
    gateway.emit(Some("uid-b"));
    let after_stop = tokio::time::timeout(Duration::from_secs(1), listener.next_event())
        .await
        .expect("next_event must not block after stop");
    assert!(after_stop.is_none());
}
