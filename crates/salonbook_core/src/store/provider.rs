//! Explicit provider scope for the customer store.
//!
//! # Responsibility
//! - Own at most one mounted [`CustomerStore`] and hand it to dependents.
//! - Fail fast with a configuration error when used while unmounted.
//!
//! # Invariants
//! - Every mount builds and activates a fresh store; nothing is shared
//!   between mounts.

use crate::repo::customer_repo::CustomerRepository;
use crate::store::customer_store::CustomerStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Programmer error: the store was accessed outside a mounted provider.
///
/// Unlike [`crate::store::StoreError`] this is not a runtime storage
/// condition and callers are not expected to recover from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderError {
    OutsideProvider,
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutsideProvider => {
                write!(f, "use_customers must be used within a mounted CustomersProvider")
            }
        }
    }
}

impl Error for ProviderError {}

pub struct CustomersProvider<R: CustomerRepository> {
    store: Option<CustomerStore<R>>,
}

impl<R: CustomerRepository> Default for CustomersProvider<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CustomerRepository> CustomersProvider<R> {
    /// Creates an unmounted provider.
    pub const fn new() -> Self {
        Self { store: None }
    }

    /// Builds a store over `repo`, activates it and makes it available.
    ///
    /// Replaces any previously mounted store. Use [`Self::mount_with`] to
    /// subscribe listeners that must see the initial load.
    pub async fn mount(&mut self, repo: R) -> &mut CustomerStore<R> {
        self.mount_with(repo, |_| {}).await
    }

    /// Like [`Self::mount`], but runs `setup` on the fresh store before
    /// activation, so listeners registered there receive `Loaded`.
    pub async fn mount_with(
        &mut self,
        repo: R,
        setup: impl FnOnce(&mut CustomerStore<R>),
    ) -> &mut CustomerStore<R> {
        if self.store.is_some() {
            info!("event=provider_mount module=store status=replace");
        }
        let mut store = CustomerStore::new(repo);
        setup(&mut store);
        store.activate().await;
        self.store.insert(store)
    }

    /// Releases the mounted store, if any.
    pub fn unmount(&mut self) -> Option<CustomerStore<R>> {
        self.store.take()
    }

    pub fn is_mounted(&self) -> bool {
        self.store.is_some()
    }

    /// Read access for dependents of this provider.
    pub fn use_customers(&self) -> Result<&CustomerStore<R>, ProviderError> {
        self.store.as_ref().ok_or(ProviderError::OutsideProvider)
    }

    /// Mutation access for dependents of this provider.
    pub fn use_customers_mut(&mut self) -> Result<&mut CustomerStore<R>, ProviderError> {
        self.store.as_mut().ok_or(ProviderError::OutsideProvider)
    }
}
