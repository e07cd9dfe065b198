//! Driven port for the hosted identity service.
//!
//! The gateway owns accounts and sessions. The application only issues
//! requests and observes identity changes; it never mutates identity state
//! directly.

use async_trait::async_trait;

use crate::domain::IdentityId;

use super::{Subscription, define_port_error};

define_port_error! {
    /// Errors raised by identity gateway adapters.
    pub enum IdentityGatewayError {
        /// The service refused the request (bad credentials, duplicate email,
        /// unknown account, weak password).
        Rejected { message: String } => "identity request rejected: {message}",
        /// The request never completed (network failure, timeout, 5xx).
        Transport { message: String } => "identity gateway unreachable: {message}",
        /// The service answered with a payload the adapter could not read.
        Decode { message: String } => "identity response could not be decoded: {message}",
    }
}

/// Callback invoked with the current identity, or `None` once signed out.
pub type IdentityChangeHandler = Box<dyn Fn(Option<IdentityId>) + Send + Sync>;

/// Port for account creation, sign-in, reset and identity notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create an account and return its identity. Gateways sign the new
    /// account in as part of creation.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError>;

    /// Verify credentials and establish a session.
    async fn sign_in(&self, email: &str, password: &str)
    -> Result<IdentityId, IdentityGatewayError>;

    /// Ask the service to email password reset instructions.
    async fn send_reset(&self, email: &str) -> Result<(), IdentityGatewayError>;

    /// End the current session, if any.
    async fn sign_out(&self) -> Result<(), IdentityGatewayError>;

    /// Register `handler` for identity changes.
    ///
    /// Implementations deliver the current identity once after registration
    /// and again whenever it changes. Delivery may happen before this method
    /// returns or later; callers must not rely on either.
    fn on_identity_change(&self, handler: IdentityChangeHandler) -> Subscription;
}
