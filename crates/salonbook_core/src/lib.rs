//! Core customer records logic for Salonbook.
//! This crate owns the record invariants, the SQLite backing store and the
//! observable store that UI bindings read from.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{
    Customer, CustomerId, CustomerPatch, CustomerValidationError, Gender, NewCustomer,
};
pub use repo::customer_repo::{
    CustomerRepository, RepoError, RepoResult, SqliteCustomerRepository,
};
pub use store::{
    CustomerStore, CustomersProvider, ListenerId, ProviderError, StoreError, StoreEvent, StoreOp,
    StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
