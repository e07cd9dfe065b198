//! Inbound adapters driving the domain from the presentation layer.

pub mod presentation;

pub use presentation::{Notice, Reaction, Route, greeting, route_for};
