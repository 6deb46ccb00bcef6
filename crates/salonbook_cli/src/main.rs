//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `salonbook_core` linkage and mount the customers provider over a
//!   database file.
//! - Print the loaded list in a stable, line-oriented format.
//!
//! Usage: `salonbook_cli [DB_PATH]` (falls back to `SALONBOOK_DB_PATH`).

use futures::executor::block_on;
use salonbook_core::{CustomersProvider, SqliteCustomerRepository};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("salonbook_core ping={}", salonbook_core::ping());
    println!("salonbook_core version={}", salonbook_core::core_version());

    let Some(db_path) = resolve_db_path() else {
        return ExitCode::SUCCESS;
    };

    let mut provider = CustomersProvider::new();
    let store = block_on(provider.mount(SqliteCustomerRepository::open(&db_path)));
    if !store.repository().is_initialized() {
        eprintln!("customers unavailable: could not open {}", db_path.display());
        return ExitCode::FAILURE;
    }

    println!("customers count={}", store.customers().len());
    for customer in store.customers() {
        println!(
            "customer id={} name={} gender={} visits={} spent={:.2} last_visit={}",
            customer.id,
            customer.name,
            customer.gender,
            customer.visit_count,
            customer.total_spent,
            if customer.last_visit.is_empty() { "-" } else { customer.last_visit.as_str() }
        );
    }
    ExitCode::SUCCESS
}

fn resolve_db_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("SALONBOOK_DB_PATH").map(PathBuf::from))
}
