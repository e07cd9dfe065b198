//! Domain ports for the hosted backend.
//!
//! Both collaborators are driven ports: the domain calls out to them and
//! receives pushes through registered callbacks. Every registration returns a
//! [`Subscription`] so release is explicit and tied to a scope.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod identity_gateway;
mod subscription;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    DocumentFields, DocumentHandler, DocumentSnapshot, DocumentStore, DocumentStoreError,
};
#[cfg(test)]
pub use identity_gateway::MockIdentityGateway;
pub use identity_gateway::{IdentityChangeHandler, IdentityGateway, IdentityGatewayError};
pub use subscription::Subscription;
