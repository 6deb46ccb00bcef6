//! Repository layer: the customer backing store.
//!
//! # Responsibility
//! - Define the CRUD contract the customer store depends on.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Customer::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `NotInitialized`)
//!   in addition to DB transport errors.

pub mod customer_repo;
