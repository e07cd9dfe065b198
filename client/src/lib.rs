//! Client core for the Umami recipe app.
//!
//! The crate is organised as a small hexagon: `domain` holds validation, the
//! auth session controller and the profile sync listener; `outbound` provides
//! backend adapters; `inbound` maps domain outcomes onto presentation concerns
//! such as routes and notices.

pub mod domain;
pub mod inbound;
pub mod outbound;
