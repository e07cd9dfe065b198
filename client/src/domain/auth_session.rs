//! Auth session controller orchestrating sign-up, sign-in and reset.
//!
//! Each operation validates locally first, performs at most the documented
//! remote calls, and converts every failure into an [`AuthOutcome`]. Nothing
//! is retried and no error propagates past the controller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{DocumentStore, IdentityGateway};
use crate::domain::validation::{FormMode, validate};
use crate::domain::{
    AuthEvent, AuthFailure, AuthOutcome, Credentials, PROFILES_COLLECTION, ProfileRecord,
};

/// Auth use cases bound to an identity gateway and a document store.
pub struct AuthSessionController<G: ?Sized, D: ?Sized> {
    gateway: Arc<G>,
    store: Arc<D>,
}

impl<G: ?Sized, D: ?Sized> Clone for AuthSessionController<G, D> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            store: Arc::clone(&self.store),
        }
    }
}

impl<G, D> AuthSessionController<G, D>
where
    G: IdentityGateway + ?Sized,
    D: DocumentStore + ?Sized,
{
    /// Create a controller over the given backends.
    pub fn new(gateway: Arc<G>, store: Arc<D>) -> Self {
        Self { gateway, store }
    }

    /// Register a new account and write its profile document.
    ///
    /// Succeeds only when both the account creation and the profile write
    /// succeed. An account whose profile write failed is left in place.
    pub async fn sign_up(&self, credentials: &Credentials) -> AuthOutcome {
        let validation = validate(credentials, FormMode::SignUp);
        if !validation.is_valid() {
            debug!(failing_fields = validation.len(), "sign-up blocked by validation");
            return AuthOutcome::Rejected(validation);
        }

        let identity = match self
            .gateway
            .create_account(credentials.email(), credentials.password())
            .await
        {
            Ok(identity) => identity,
            Err(error) => {
                warn!(error = %error, "account creation failed");
                return AuthOutcome::Failed(AuthFailure::Registration);
            }
        };

        let fields = ProfileRecord::from_credentials(credentials).to_fields();
        if let Err(error) = self
            .store
            .write_document(PROFILES_COLLECTION, identity.as_ref(), &fields)
            .await
        {
            warn!(
                identity = %identity,
                error = %error,
                "profile write failed after account creation; account has no profile"
            );
            return AuthOutcome::Failed(AuthFailure::Registration);
        }

        info!(identity = %identity, "registration complete");
        AuthOutcome::Completed(AuthEvent::RegistrationComplete { identity })
    }

    /// Verify credentials and establish a session.
    ///
    /// Only email presence is checked locally; a missing or wrong password is
    /// left for the gateway to reject.
    pub async fn sign_in(&self, credentials: &Credentials) -> AuthOutcome {
        let validation = validate(credentials, FormMode::SignIn);
        if !validation.is_valid() {
            debug!("sign-in blocked by validation");
            return AuthOutcome::Rejected(validation);
        }

        match self
            .gateway
            .sign_in(credentials.email(), credentials.password())
            .await
        {
            Ok(identity) => {
                info!(identity = %identity, "session established");
                AuthOutcome::Completed(AuthEvent::SessionEstablished { identity })
            }
            Err(error) => {
                warn!(error = %error, "sign-in failed");
                AuthOutcome::Failed(AuthFailure::SignIn)
            }
        }
    }

    /// Ask the gateway to email reset instructions to `email`.
    pub async fn send_password_reset(&self, email: &str) -> AuthOutcome {
        let credentials = Credentials::sign_in(email, "");
        let validation = validate(&credentials, FormMode::Reset);
        if !validation.is_valid() {
            debug!("password reset blocked by validation");
            return AuthOutcome::Rejected(validation);
        }

        match self.gateway.send_reset(credentials.email()).await {
            Ok(()) => {
                info!("password reset email requested");
                AuthOutcome::Completed(AuthEvent::ResetEmailSent)
            }
            Err(error) => {
                warn!(error = %error, "password reset request failed");
                AuthOutcome::Failed(AuthFailure::PasswordReset)
            }
        }
    }

    /// End the current session.
    pub async fn sign_out(&self) -> AuthOutcome {
        match self.gateway.sign_out().await {
            Ok(()) => {
                info!("signed out");
                AuthOutcome::Completed(AuthEvent::SignedOut)
            }
            Err(error) => {
                warn!(error = %error, "sign-out failed");
                AuthOutcome::Failed(AuthFailure::SignOut)
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_session_tests.rs"]
mod tests;
