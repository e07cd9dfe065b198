//! Opaque identity references issued by the identity gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`IdentityId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Identifier was empty.
    Empty,
    /// Identifier contained whitespace, which gateways never issue.
    ContainsWhitespace,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identity id must not be empty"),
            Self::ContainsWhitespace => write!(f, "identity id must not contain whitespace"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Identifier of an authenticated account.
///
/// The application never interprets the value; it is only used to key the
/// profile document and to compare identity-change events.
///
/// ## Invariants
/// - Non-empty.
/// - Contains no whitespace.
///
/// # Examples
/// ```
/// use umami_client::domain::IdentityId;
///
/// let id = IdentityId::new("Xq3kPz9aB1").expect("valid id");
/// assert_eq!(id.as_ref(), "Xq3kPz9aB1");
/// assert!(IdentityId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Validate and construct an [`IdentityId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(id.into())
    }

    fn from_owned(id: String) -> Result<Self, IdentityValidationError> {
        if id.is_empty() {
            return Err(IdentityValidationError::Empty);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(IdentityValidationError::ContainsWhitespace);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
