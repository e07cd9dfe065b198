//! Outcomes returned by the auth session controller.
//!
//! The controller never navigates or shows alerts itself. It returns an
//! [`AuthOutcome`] and inbound adapters translate that into routes, notices
//! and inline field errors.

use crate::domain::{IdentityId, ValidationResult};

/// Successful transitions produced by auth operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Account created and profile document written.
    RegistrationComplete { identity: IdentityId },
    /// Credentials verified and a session established.
    SessionEstablished { identity: IdentityId },
    /// The gateway accepted the reset email request.
    ResetEmailSent,
    /// The session was ended.
    SignedOut,
}

/// Operation-level failures. Gateway error subkinds are not surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Registration,
    SignIn,
    PasswordReset,
    SignOut,
}

impl AuthFailure {
    /// Machine-readable failure code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Registration => "registration_failed",
            Self::SignIn => "sign_in_failed",
            Self::PasswordReset => "password_reset_failed",
            Self::SignOut => "sign_out_failed",
        }
    }
}

/// Result of one auth operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Local validation failed; no remote call was made.
    Rejected(ValidationResult),
    /// The operation succeeded.
    Completed(AuthEvent),
    /// A remote call failed; the form stays as it was.
    Failed(AuthFailure),
}

impl AuthOutcome {
    /// True for [`AuthOutcome::Completed`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Success event, if any.
    pub fn event(&self) -> Option<&AuthEvent> {
        match self {
            Self::Completed(event) => Some(event),
            _ => None,
        }
    }

    /// Field errors, if validation blocked the operation.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Rejected(result) => Some(result),
            _ => None,
        }
    }

    /// Remote failure, if any.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Failed(failure) => Some(*failure),
            _ => None,
        }
    }
}
