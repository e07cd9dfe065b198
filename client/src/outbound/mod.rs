//! Outbound adapters implementing the domain ports.
//!
//! - **memory**: process-local backend used by tests and offline development
//! - **rest**: reqwest adapters for the hosted identity and document services
//!
//! Adapters translate between domain types and wire representations. They
//! contain no auth or profile logic.

mod listeners;
pub mod memory;
pub mod rest;

pub use memory::{BackendOperation, InMemoryBackend};
