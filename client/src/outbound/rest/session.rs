//! Session token shared between the REST identity and document adapters.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::IdentityId;
use crate::domain::ports::{IdentityChangeHandler, Subscription};
use crate::outbound::listeners::{IdentityListener, ListenerRegistry};

struct SessionToken {
    identity: IdentityId,
    id_token: Zeroizing<String>,
}

/// Signed-in identity plus its bearer token.
#[derive(Default)]
pub(crate) struct RestSession {
    token: Mutex<Option<SessionToken>>,
    listeners: ListenerRegistry<IdentityListener>,
}

impl RestSession {
    fn token(&self) -> MutexGuard<'_, Option<SessionToken>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the session, notifying listeners when the identity changed.
    pub(crate) fn establish(&self, identity: IdentityId, id_token: String) {
        let changed = {
            let mut token = self.token();
            let changed = token.as_ref().map(|current| &current.identity) != Some(&identity);
            *token = Some(SessionToken {
                identity: identity.clone(),
                id_token: Zeroizing::new(id_token),
            });
            changed
        };
        if changed {
            debug!(identity = %identity, "session established");
            self.notify(Some(identity));
        }
    }

    /// Forget the session, notifying listeners if one existed.
    pub(crate) fn clear(&self) {
        let previous = self.token().take();
        if previous.is_some() {
            debug!("session cleared");
            self.notify(None);
        }
    }

    pub(crate) fn identity(&self) -> Option<IdentityId> {
        self.token().as_ref().map(|token| token.identity.clone())
    }

    pub(crate) fn id_token(&self) -> Option<Zeroizing<String>> {
        self.token().as_ref().map(|token| token.id_token.clone())
    }

    /// Register `handler` and deliver the current identity to it.
    pub(crate) fn subscribe(&self, handler: IdentityChangeHandler) -> Subscription {
        let handler: Arc<IdentityListener> = Arc::from(handler);
        let subscription = self.listeners.register(Arc::clone(&handler));
        handler(self.identity());
        subscription
    }

    pub(crate) fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, identity: Option<IdentityId>) {
        for listener in self.listeners.listeners() {
            listener(identity.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn id(raw: &str) -> IdentityId {
        IdentityId::new(raw).expect("fixture identity")
    }

    #[rstest]
    fn listeners_hear_identity_changes_only() {
        let session = RestSession::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = session.subscribe(Box::new(move |identity| {
            sink.lock().expect("seen lock").push(identity);
        }));

        session.establish(id("uid-a"), "token-1".to_owned());
        session.establish(id("uid-a"), "token-2".to_owned());
        session.clear();
        session.clear();

        assert_eq!(
            *seen.lock().expect("seen lock"),
            vec![None, Some(id("uid-a")), None]
        );
        drop(subscription);
        assert_eq!(session.active_listeners(), 0);
    }

    #[rstest]
    fn refreshed_tokens_replace_the_old_one() {
        let session = RestSession::default();
        session.establish(id("uid-a"), "token-1".to_owned());
        session.establish(id("uid-a"), "token-2".to_owned());

        assert_eq!(session.id_token().as_deref().map(String::as_str), Some("token-2"));
        assert_eq!(session.identity(), Some(id("uid-a")));
    }
}
