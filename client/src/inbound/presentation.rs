//! Presentation adapter turning domain outcomes into screen reactions.
//!
//! Screens hand an [`AuthOutcome`] to [`Reaction::from_outcome`] and receive
//! the route to show, an optional notice, and the inline field errors. The
//! home screen reads its greeting from the current [`ProfileState`].

use crate::domain::{AuthEvent, AuthFailure, AuthOutcome, Field, ProfileState};

/// Greeting shown while a signed-in profile document is loading.
pub const LOADING_GREETING: &str = "Loading...";
/// Greeting shown when nobody is signed in, including before the first
/// identity event, or when no name is stored.
pub const GUEST_GREETING: &str = "Guest";

/// Screens an auth outcome can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

/// Destination after a successful operation.
pub fn route_for(event: &AuthEvent) -> Route {
    match event {
        AuthEvent::RegistrationComplete { .. }
        | AuthEvent::ResetEmailSent
        | AuthEvent::SignedOut => Route::Login,
        AuthEvent::SessionEstablished { .. } => Route::Home,
    }
}

/// Modal notice with a title and a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: &'static str,
}

impl Notice {
    /// Notice for a successful operation. Sign-out shows none.
    pub fn for_event(event: &AuthEvent) -> Option<Self> {
        let (title, message) = match event {
            AuthEvent::RegistrationComplete { .. } => {
                ("Registration Successful", "User registered successfully!")
            }
            AuthEvent::SessionEstablished { .. } => ("Login Successful", "You are now signed in."),
            AuthEvent::ResetEmailSent => (
                "Password Reset Email Sent",
                "An email containing instructions to reset your password has been sent to your \
                 email address.",
            ),
            AuthEvent::SignedOut => return None,
        };
        Some(Self { title, message })
    }

    /// Notice for a failed operation.
    pub fn for_failure(failure: AuthFailure) -> Self {
        let (title, message) = match failure {
            AuthFailure::Registration => (
                "Registration Unsuccessful",
                "There was an error during the registration process.",
            ),
            AuthFailure::SignIn => ("Login Unsuccessful", "Invalid email or password!"),
            AuthFailure::PasswordReset => (
                "Password Reset Failed",
                "There was an error while attempting to reset your password. Please try again \
                 later.",
            ),
            AuthFailure::SignOut => ("Sign Out Failed", "Could not sign out. Please try again."),
        };
        Self { title, message }
    }
}

/// Everything a screen does in response to one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reaction {
    /// Route to navigate to, or `None` to stay on the current screen.
    pub navigate: Option<Route>,
    pub notice: Option<Notice>,
    /// Inline errors keyed by field, in field order.
    pub field_errors: Vec<(Field, &'static str)>,
}

impl Reaction {
    pub fn from_outcome(outcome: &AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Rejected(validation) => Self {
                field_errors: validation
                    .iter()
                    .map(|(field, error)| (field, error.message()))
                    .collect(),
                ..Self::default()
            },
            AuthOutcome::Completed(event) => Self {
                navigate: Some(route_for(event)),
                notice: Notice::for_event(event),
                field_errors: Vec::new(),
            },
            AuthOutcome::Failed(failure) => Self {
                notice: Some(Notice::for_failure(*failure)),
                ..Self::default()
            },
        }
    }
}

/// Name shown on the home screen for `state`.
pub fn greeting(state: &ProfileState) -> &str {
    match state {
        ProfileState::Unauthenticated | ProfileState::AuthenticatedNoProfile { .. } => {
            GUEST_GREETING
        }
        ProfileState::AuthenticatedLoading { .. } => LOADING_GREETING,
        ProfileState::AuthenticatedWithProfile { profile, .. } if profile.name().is_empty() => {
            GUEST_GREETING
        }
        ProfileState::AuthenticatedWithProfile { profile, .. } => profile.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::{FieldError, IdentityId, ProfileDocument, ValidationResult};

    fn ada() -> IdentityId {
        IdentityId::new("uid-ada").expect("fixture identity")
    }

    #[rstest]
    #[case(AuthEvent::RegistrationComplete { identity: ada() }, Route::Login)]
    #[case(AuthEvent::SessionEstablished { identity: ada() }, Route::Home)]
    #[case(AuthEvent::ResetEmailSent, Route::Login)]
    #[case(AuthEvent::SignedOut, Route::Login)]
    fn successes_navigate(#[case] event: AuthEvent, #[case] route: Route) {
        let reaction = Reaction::from_outcome(&AuthOutcome::Completed(event));
        assert_eq!(reaction.navigate, Some(route));
        assert!(reaction.field_errors.is_empty());
    }

    #[rstest]
    #[case(AuthFailure::Registration, "Registration Unsuccessful")]
    #[case(AuthFailure::SignIn, "Login Unsuccessful")]
    #[case(AuthFailure::PasswordReset, "Password Reset Failed")]
    fn failures_stay_put_with_a_notice(#[case] failure: AuthFailure, #[case] title: &str) {
        let reaction = Reaction::from_outcome(&AuthOutcome::Failed(failure));
        assert_eq!(reaction.navigate, None);
        assert_eq!(reaction.notice.map(|notice| notice.title), Some(title));
    }

    #[test]
    fn validation_errors_show_inline_without_a_notice() {
        let reaction = Reaction::from_outcome(&AuthOutcome::Rejected(ValidationResult::single(
            Field::Email,
            FieldError::EmailInvalid,
        )));

        assert_eq!(reaction.navigate, None);
        assert_eq!(reaction.notice, None);
        assert_eq!(
            reaction.field_errors,
            vec![(Field::Email, "Invalid email format")]
        );
    }

    #[test]
    fn reset_notice_matches_the_sent_message() {
        let notice = Notice::for_event(&AuthEvent::ResetEmailSent).expect("reset shows a notice");
        assert_eq!(
            notice.message,
            "An email containing instructions to reset your password has been sent to your email \
             address."
        );
    }

    #[rstest]
    #[case(ProfileState::default(), "Guest")]
    #[case(ProfileState::Unauthenticated, "Guest")]
    #[case(ProfileState::AuthenticatedLoading { identity: ada() }, "Loading...")]
    #[case(ProfileState::AuthenticatedNoProfile { identity: ada() }, "Guest")]
    #[case(
        ProfileState::AuthenticatedWithProfile { identity: ada(), profile: ProfileDocument::new("Ada") },
        "Ada"
    )]
    #[case(
        ProfileState::AuthenticatedWithProfile { identity: ada(), profile: ProfileDocument::new("") },
        "Guest"
    )]
    fn greetings_follow_profile_state(#[case] state: ProfileState, #[case] expected: &str) {
        assert_eq!(greeting(&state), expected);
    }
}
