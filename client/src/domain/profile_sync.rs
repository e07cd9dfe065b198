//! Profile sync listener driven by identity-change events.
//!
//! The listener holds two subscriptions: one to identity changes and, while
//! signed in, one to the identity's profile document. Backend callbacks only
//! enqueue events; the listener applies them one at a time, so all state
//! lives on a single logical thread of control.
//!
//! Document pushes are tagged with the generation of the subscription that
//! produced them. Replacing or releasing the document subscription bumps the
//! generation, so pushes for a superseded identity are discarded even if they
//! were already queued.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::ports::{
    DocumentSnapshot, DocumentStore, DocumentStoreError, IdentityGateway, Subscription,
};
use crate::domain::{IdentityId, PROFILES_COLLECTION, ProfileDocument};

/// What the application currently knows about the signed-in profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileState {
    /// No identity, or no identity-change event received yet.
    #[default]
    Unauthenticated,
    /// Signed in; waiting for the first document push.
    AuthenticatedLoading { identity: IdentityId },
    /// Signed in and the profile document exists.
    AuthenticatedWithProfile {
        identity: IdentityId,
        profile: ProfileDocument,
    },
    /// Signed in but no profile document is stored.
    AuthenticatedNoProfile { identity: IdentityId },
}

impl ProfileState {
    /// Identity the state refers to, if signed in.
    pub fn identity(&self) -> Option<&IdentityId> {
        match self {
            Self::Unauthenticated => None,
            Self::AuthenticatedLoading { identity }
            | Self::AuthenticatedWithProfile { identity, .. }
            | Self::AuthenticatedNoProfile { identity } => Some(identity),
        }
    }

    /// Loaded profile, if any.
    pub fn profile(&self) -> Option<&ProfileDocument> {
        match self {
            Self::AuthenticatedWithProfile { profile, .. } => Some(profile),
            _ => None,
        }
    }

    /// True in every authenticated state.
    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

#[derive(Debug)]
enum SyncEvent {
    IdentityChanged(Option<IdentityId>),
    DocumentPushed {
        generation: u64,
        result: Result<DocumentSnapshot, DocumentStoreError>,
    },
}

/// Keeps [`ProfileState`] in step with the gateway and the document store.
///
/// Dropping the listener releases both subscriptions.
pub struct ProfileSyncListener<G: ?Sized, D: ?Sized> {
    gateway: Arc<G>,
    store: Arc<D>,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
    events_rx: mpsc::UnboundedReceiver<SyncEvent>,
    state: ProfileState,
    state_tx: watch::Sender<ProfileState>,
    identity_subscription: Option<Subscription>,
    document_subscription: Option<Subscription>,
    generation: u64,
}

impl<G, D> ProfileSyncListener<G, D>
where
    G: IdentityGateway + ?Sized,
    D: DocumentStore + ?Sized,
{
    /// Create a listener in the `Unauthenticated` state.
    ///
    /// Nothing is registered until [`ProfileSyncListener::start`] is called.
    pub fn new(gateway: Arc<G>, store: Arc<D>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ProfileState::Unauthenticated);
        Self {
            gateway,
            store,
            events_tx,
            events_rx,
            state: ProfileState::Unauthenticated,
            state_tx,
            identity_subscription: None,
            document_subscription: None,
            generation: 0,
        }
    }

    /// Register for identity changes. Calling it again while running is a
    /// no-op.
    pub fn start(&mut self) {
        if self.identity_subscription.is_some() {
            return;
        }
        let events = self.events_tx.clone();
        let subscription = self.gateway.on_identity_change(Box::new(move |identity| {
            if events.send(SyncEvent::IdentityChanged(identity)).is_err() {
                debug!("identity change arrived after listener shut down");
            }
        }));
        self.identity_subscription = Some(subscription);
        debug!("profile sync listener started");
    }

    /// Release both subscriptions and drop any queued events.
    ///
    /// Safe to call in any state and any number of times.
    pub fn stop(&mut self) {
        if let Some(mut subscription) = self.identity_subscription.take() {
            subscription.release();
            debug!("identity subscription released");
        }
        self.release_document();
        while self.events_rx.try_recv().is_ok() {}
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.identity_subscription.is_some()
    }

    /// Latest state.
    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    /// Receiver that observes every state transition.
    pub fn watch(&self) -> watch::Receiver<ProfileState> {
        self.state_tx.subscribe()
    }

    /// Number of subscriptions currently held (0, 1 or 2).
    pub fn held_subscriptions(&self) -> usize {
        usize::from(self.identity_subscription.is_some())
            + usize::from(self.document_subscription.is_some())
    }

    /// Wait for the next event and apply it, returning the resulting state.
    ///
    /// Returns `None` when the listener is not running, so a loop over this
    /// method ends once [`stop`](Self::stop) has been called.
    pub async fn next_event(&mut self) -> Option<&ProfileState> {
        if !self.is_running() {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.apply(event);
        Some(&self.state)
    }

    /// Apply every event that is already queued. Returns how many were
    /// applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Process events until `shutdown` resolves, then release everything.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future,
    {
        self.start();
        tokio::pin!(shutdown);
        loop {
            let event = tokio::select! {
                _ = &mut shutdown => None,
                event = self.events_rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            self.apply(event);
        }
        self.stop();
    }

    fn apply(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::IdentityChanged(identity) => {
                if !self.is_running() {
                    debug!("identity change ignored; listener stopped");
                    return;
                }
                self.on_identity_changed(identity);
            }
            SyncEvent::DocumentPushed { generation, result } => {
                if generation != self.generation || self.document_subscription.is_none() {
                    debug!(generation, current = self.generation, "stale document push dropped");
                    return;
                }
                self.on_document_pushed(result);
            }
        }
    }

    fn on_identity_changed(&mut self, identity: Option<IdentityId>) {
        self.release_document();
        match identity {
            None => {
                info!("identity cleared; profile sync idle");
                self.set_state(ProfileState::Unauthenticated);
            }
            Some(identity) => {
                info!(identity = %identity, "identity changed; subscribing to profile");
                self.set_state(ProfileState::AuthenticatedLoading {
                    identity: identity.clone(),
                });
                self.open_document(&identity);
            }
        }
    }

    fn on_document_pushed(&mut self, result: Result<DocumentSnapshot, DocumentStoreError>) {
        let Some(identity) = self.state.identity().cloned() else {
            return;
        };
        match result {
            Ok(snapshot) if snapshot.exists => {
                let profile = ProfileDocument::from_fields(&snapshot.data);
                debug!(identity = %identity, "profile document received");
                self.set_state(ProfileState::AuthenticatedWithProfile { identity, profile });
            }
            Ok(_) => {
                debug!(identity = %identity, "no profile document stored");
                self.set_state(ProfileState::AuthenticatedNoProfile { identity });
            }
            Err(error) => {
                warn!(identity = %identity, error = %error, "profile subscription error");
            }
        }
    }

    fn open_document(&mut self, identity: &IdentityId) {
        let generation = self.generation;
        let events = self.events_tx.clone();
        let subscription = self.store.subscribe_document(
            PROFILES_COLLECTION,
            identity.as_ref(),
            Box::new(move |result| {
                if events
                    .send(SyncEvent::DocumentPushed { generation, result })
                    .is_err()
                {
                    debug!("document push arrived after listener shut down");
                }
            }),
        );
        self.document_subscription = Some(subscription);
    }

    fn release_document(&mut self) {
        if let Some(mut subscription) = self.document_subscription.take() {
            subscription.release();
            debug!(generation = self.generation, "document subscription released");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    fn set_state(&mut self, state: ProfileState) {
        self.state_tx.send_replace(state.clone());
        self.state = state;
    }
}

impl<G: ?Sized, D: ?Sized> Drop for ProfileSyncListener<G, D> {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.identity_subscription.take() {
            subscription.release();
        }
        if let Some(mut subscription) = self.document_subscription.take() {
            subscription.release();
        }
    }
}

#[cfg(test)]
#[path = "profile_sync_tests.rs"]
mod tests;
