//! Customer domain model.
//!
//! # Responsibility
//! - Define the record, creation input and patch types used across layers.

pub mod customer;
