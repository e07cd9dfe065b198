//! Form validation engine for the auth screens.
//!
//! Validation is pure and recomputed from scratch on every submission. The
//! result maps each failing [`Field`] to a [`FieldError`]; a form may be
//! submitted only when no field carries an error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::Credentials;

/// Minimum number of characters a sign-up password must contain.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Which form is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormMode {
    /// Registration: every field is checked.
    SignUp,
    /// Login: only email presence is checked before calling the gateway.
    SignIn,
    /// Password reset: only email presence is checked.
    Reset,
}

/// Credential form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
    Username,
    Password,
    ConfirmPassword,
}

impl Field {
    /// Every field in display order.
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Email,
        Self::Username,
        Self::Password,
        Self::ConfirmPassword,
    ];

    /// Stable field key used by presentation adapters.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Username => "username",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
        }
    }
}

/// Reasons a single field can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    NameRequired,
    EmailRequired,
    EmailInvalid,
    UsernameRequired,
    PasswordRequired,
    PasswordTooWeak,
    ConfirmPasswordRequired,
    PasswordMismatch,
}

impl FieldError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NameRequired
            | Self::EmailRequired
            | Self::UsernameRequired
            | Self::PasswordRequired
            | Self::ConfirmPasswordRequired => "required",
            Self::EmailInvalid => "invalid_format",
            Self::PasswordTooWeak => "too_weak",
            Self::PasswordMismatch => "mismatch",
        }
    }

    /// Inline message shown beneath the field.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NameRequired => "Name is required",
            Self::EmailRequired => "Email is required",
            Self::EmailInvalid => "Invalid email format",
            Self::UsernameRequired => "Username is required",
            Self::PasswordRequired => "Password is required",
            Self::PasswordTooWeak => {
                "Password must include at least one lowercase letter, one uppercase letter, \
                 one number, and be at least 8 characters long"
            }
            Self::ConfirmPasswordRequired => "Confirm Password is required",
            Self::PasswordMismatch => "Passwords do not match",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FieldError {}

/// Per-field outcome of validating a form.
///
/// ## Invariants
/// - A field is present only when it failed validation.
/// - [`ValidationResult::is_valid`] holds iff no field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<Field, FieldError>,
}

impl ValidationResult {
    /// Result with no errors.
    pub fn valid() -> Self {
        Self::default()
    }

    /// Result carrying a single field error.
    pub fn single(field: Field, error: FieldError) -> Self {
        let mut result = Self::default();
        result.errors.insert(field, error);
        result
    }

    /// True when the form may be submitted.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error recorded for `field`, if any.
    pub fn error(&self, field: Field) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    /// Inline message for `field`, if any.
    pub fn message(&self, field: Field) -> Option<&'static str> {
        self.error(field).map(|error| error.message())
    }

    /// Failing fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldError)> + '_ {
        self.errors.iter().map(|(field, error)| (*field, *error))
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no field failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, field: Field, check: Result<(), FieldError>) {
        if let Err(error) = check {
            self.errors.insert(field, error);
        }
    }
}

/// Validate `credentials` for the given form.
///
/// # Examples
/// ```
/// use umami_client::domain::{Credentials, Field, FieldError, FormMode, validate};
///
/// let creds = Credentials::sign_up("Ada", "ada@b.co", "ada", "Abcdefg1", "Abcdefg2");
/// let result = validate(&creds, FormMode::SignUp);
/// assert!(!result.is_valid());
/// assert_eq!(result.error(Field::ConfirmPassword), Some(FieldError::PasswordMismatch));
/// ```
pub fn validate(credentials: &Credentials, mode: FormMode) -> ValidationResult {
    let mut result = ValidationResult::valid();
    match mode {
        FormMode::SignUp => {
            result.record(Field::Name, required(credentials.name(), FieldError::NameRequired));
            result.record(Field::Email, check_email(credentials.email()));
            result.record(
                Field::Username,
                required(credentials.username(), FieldError::UsernameRequired),
            );
            result.record(Field::Password, check_password(credentials.password()));
            result.record(
                Field::ConfirmPassword,
                check_confirmation(credentials.password(), credentials.confirm_password()),
            );
        }
        FormMode::SignIn | FormMode::Reset => {
            result.record(
                Field::Email,
                required(credentials.email(), FieldError::EmailRequired),
            );
        }
    }
    result
}

fn required(value: &str, error: FieldError) -> Result<(), FieldError> {
    if value.is_empty() { Err(error) } else { Ok(()) }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape only: non-space runs around `@` and a dot.
        Regex::new(r"\S+@\S+\.\S+")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// True when `email` has the general `local@domain.tld` shape.
pub fn is_email_shaped(email: &str) -> bool {
    email_regex().is_match(email)
}

fn check_email(email: &str) -> Result<(), FieldError> {
    required(email, FieldError::EmailRequired)?;
    if is_email_shaped(email) {
        Ok(())
    } else {
        Err(FieldError::EmailInvalid)
    }
}

/// True when `password` meets the sign-up strength policy.
///
/// The policy requires an ASCII lowercase letter, an ASCII uppercase letter,
/// an ASCII digit and at least [`PASSWORD_MIN_CHARS`] characters.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_CHARS
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn check_password(password: &str) -> Result<(), FieldError> {
    required(password, FieldError::PasswordRequired)?;
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(FieldError::PasswordTooWeak)
    }
}

fn check_confirmation(password: &str, confirmation: &str) -> Result<(), FieldError> {
    required(confirmation, FieldError::ConfirmPasswordRequired)?;
    if confirmation == password {
        Ok(())
    } else {
        Err(FieldError::PasswordMismatch)
    }
}
