//! Form credentials captured while a user is on an auth screen.
//!
//! Values are mutated per keystroke by the presentation layer and validated
//! on submission. Nothing here is persisted.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::validation::Field;

/// Raw credential inputs for the sign-up, sign-in and reset forms.
///
/// Fields that a form does not show simply stay empty; validation only looks
/// at the fields relevant to the active [`FormMode`](crate::domain::FormMode).
///
/// # Examples
/// ```
/// use umami_client::domain::{Credentials, Field};
///
/// let mut creds = Credentials::sign_in("cook@example.com", "");
/// creds.set(Field::Password, "Abcdefg1");
/// assert_eq!(creds.email(), "cook@example.com");
/// assert_eq!(creds.password(), "Abcdefg1");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    name: String,
    email: String,
    username: String,
    password: Zeroizing<String>,
    confirm_password: Zeroizing<String>,
}

impl Credentials {
    /// Empty credentials, as present when a screen is first shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials for the registration form.
    pub fn sign_up(
        name: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            username: username.into(),
            password: Zeroizing::new(password.into()),
            confirm_password: Zeroizing::new(confirm_password.into()),
        }
    }

    /// Credentials for the login form.
    pub fn sign_in(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            ..Self::default()
        }
    }

    /// Replace a single field, mirroring a text edit on the form.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Username => self.username = value,
            Field::Password => self.password = Zeroizing::new(value),
            Field::ConfirmPassword => self.confirm_password = Zeroizing::new(value),
        }
    }

    /// Builder-style variant of [`Credentials::set`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Current value of `field`.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => self.name(),
            Field::Email => self.email(),
            Field::Username => self.username(),
            Field::Password => self.password(),
            Field::ConfirmPassword => self.confirm_password(),
        }
    }

    /// Display name entered on registration.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Email address used as the account login.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Public handle entered on registration.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Password confirmation as typed.
    pub fn confirm_password(&self) -> &str {
        self.confirm_password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}
