//! Observable customer store and its provider scope.
//!
//! # Responsibility
//! - Mirror repository state into an ordered in-memory list for UI bindings.
//! - Separate storage failures (`StoreError`) from misuse (`ProviderError`).

pub mod customer_store;
pub mod provider;

pub use customer_store::{
    CustomerStore, ListenerId, StoreError, StoreEvent, StoreOp, StoreResult,
};
pub use provider::{CustomersProvider, ProviderError};
