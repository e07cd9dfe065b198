//! Scoped handles for listener registrations.
//!
//! Adapters hand out a [`Subscription`] whenever they register a callback.
//! The handle runs its release action exactly once: on the first call to
//! [`Subscription::release`] or when dropped, whichever happens first.

use std::fmt;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle detaching a registered listener when released or dropped.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use umami_client::domain::ports::Subscription;
///
/// let releases = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&releases);
/// let mut subscription = Subscription::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// subscription.release();
/// subscription.release();
/// drop(subscription);
/// assert_eq!(releases.load(Ordering::SeqCst), 1);
/// ```
#[must_use = "dropping a subscription releases it immediately"]
pub struct Subscription {
    release: Option<ReleaseFn>,
}

impl Subscription {
    /// Wrap the action that detaches the listener.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Handle with nothing to release, used when registration never happened.
    pub fn inert() -> Self {
        Self { release: None }
    }

    /// True until the release action has run.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Run the release action if it has not run yet.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rstest::rstest;

    fn counting() -> (Arc<AtomicUsize>, Subscription) {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&releases);
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (releases, subscription)
    }

    #[rstest]
    fn drop_releases_once() {
        let (releases, subscription) = counting();
        assert!(subscription.is_active());
        drop(subscription);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn explicit_release_is_idempotent() {
        let (releases, mut subscription) = counting();
        subscription.release();
        assert!(!subscription.is_active());
        subscription.release();
        drop(subscription);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn inert_handles_are_never_active() {
        let mut subscription = Subscription::inert();
        assert!(!subscription.is_active());
        subscription.release();
        assert_eq!(format!("{subscription:?}"), "Subscription { active: false }");
    }
}
