//! Profile documents stored per identity.

use serde_json::Value;

use crate::domain::Credentials;
use crate::domain::ports::DocumentFields;

/// Collection holding one profile document per identity id.
pub const PROFILES_COLLECTION: &str = "users";

/// Profile fields written once registration succeeds.
///
/// Only display data is stored. Credentials stay with the identity gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    name: String,
    email: String,
    username: String,
}

impl ProfileRecord {
    /// Build a record from explicit values.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            username: username.into(),
        }
    }

    /// Extract the profile part of registration credentials.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(
            credentials.name(),
            credentials.email(),
            credentials.username(),
        )
    }

    /// Document body for this record.
    ///
    /// # Examples
    /// ```
    /// use umami_client::domain::ProfileRecord;
    ///
    /// let fields = ProfileRecord::new("Ada", "ada@example.com", "ada").to_fields();
    /// assert_eq!(fields.get("username").and_then(|v| v.as_str()), Some("ada"));
    /// assert!(fields.get("password").is_none());
    /// ```
    pub fn to_fields(&self) -> DocumentFields {
        let mut fields = DocumentFields::new();
        fields.insert("name".to_owned(), Value::String(self.name.clone()));
        fields.insert("email".to_owned(), Value::String(self.email.clone()));
        fields.insert("username".to_owned(), Value::String(self.username.clone()));
        fields
    }
}

/// Profile data observed by the home screen.
///
/// A document without a string `name` decodes to an empty name; the
/// presentation layer decides what to show in that case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileDocument {
    name: String,
}

impl ProfileDocument {
    /// Build a profile with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Read the observed attributes out of a document body.
    pub fn from_fields(fields: &DocumentFields) -> Self {
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Self::new(name)
    }

    /// Display name, possibly empty.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}
