//! Domain primitives and services for authentication and profile sync.
//!
//! Purpose: keep credential validation, auth orchestration and the profile
//! subscription state machine free of transport details. Remote backends are
//! reached only through the traits in [`ports`].
//!
//! Public surface:
//! - Credentials / Field / FormMode / ValidationResult: form input and its
//!   validation.
//! - IdentityId: opaque identity reference issued by the gateway.
//! - ProfileDocument / ProfileRecord: what is read from and written to the
//!   per-user document.
//! - AuthSessionController: sign-up, sign-in, reset and sign-out use cases.
//! - ProfileSyncListener / ProfileState: identity-driven profile
//!   subscription.

pub mod auth_events;
pub mod auth_session;
pub mod credentials;
pub mod identity;
pub mod ports;
pub mod profile;
pub mod profile_sync;
pub mod validation;

pub use self::auth_events::{AuthEvent, AuthFailure, AuthOutcome};
pub use self::auth_session::AuthSessionController;
pub use self::credentials::Credentials;
pub use self::identity::{IdentityId, IdentityValidationError};
pub use self::profile::{PROFILES_COLLECTION, ProfileDocument, ProfileRecord};
pub use self::profile_sync::{ProfileState, ProfileSyncListener};
pub use self::validation::{Field, FieldError, FormMode, ValidationResult, validate};
