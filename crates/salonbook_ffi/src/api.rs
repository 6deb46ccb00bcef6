//! FFI customer-list API for Flutter-facing calls.
//!
//! # Responsibility
//! - Hold the process-wide customers provider and expose it through plain
//!   DTO envelopes.
//! - Publish a change revision so the UI can re-read the list after updates.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Calls before `customers_mount` fail with the provider configuration
//!   error instead of touching storage.

use futures::executor::block_on;
use log::warn;
use salonbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Customer, CustomerPatch, CustomerStore, CustomersProvider, Gender, NewCustomer,
    ProviderError, SqliteCustomerRepository,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

const DB_PATH_ENV: &str = "SALONBOOK_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "salonbook_customers.sqlite3";

type Provider = CustomersProvider<SqliteCustomerRepository>;

static PROVIDER: Mutex<Provider> = Mutex::new(CustomersProvider::new());
static REVISION: AtomicU64 = AtomicU64::new(0);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Customer row as rendered by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerItem {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// `male|female`.
    pub gender: String,
    pub visit_count: u32,
    pub total_spent: f64,
    pub last_visit: String,
    pub preferred_services: Vec<String>,
    pub notes: Option<String>,
    pub photo: String,
}

/// Form input for `customers_add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub gender: String,
    pub preferred_services: Vec<String>,
    pub notes: Option<String>,
    pub photo: String,
}

/// Partial edit for `customers_update`. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerPatchInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub visit_count: Option<u32>,
    pub total_spent: Option<f64>,
    pub last_visit: Option<String>,
    pub preferred_services: Option<Vec<String>>,
    /// Blank text clears notes, as it does on add.
    pub notes: Option<String>,
    /// Clears notes; takes precedence over `notes`.
    pub clear_notes: bool,
    pub photo: Option<String>,
}

/// Mount result. Load failures are not reported here; the list is just empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountResponse {
    pub count: u32,
    pub db_path: String,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerListResponse {
    pub ok: bool,
    pub items: Vec<CustomerItem>,
    pub revision: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerActionResponse {
    pub ok: bool,
    /// Created record for `customers_add`.
    pub customer: Option<CustomerItem>,
    pub message: String,
}

impl CustomerActionResponse {
    fn success(message: impl Into<String>, customer: Option<CustomerItem>) -> Self {
        Self {
            ok: true,
            customer,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            customer: None,
            message: message.into(),
        }
    }
}

/// Mounts the customers provider over `db_path` (or the configured default)
/// and loads the stored list.
///
/// Replaces any previous mount. A successful load bumps the revision; a
/// failed one leaves it untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn customers_mount(db_path: Option<String>) -> MountResponse {
    let path = resolve_db_path(db_path);
    let mut provider = lock_provider();
    let store = block_on(
        provider.mount_with(SqliteCustomerRepository::open(&path), |store| {
            store.subscribe(|_, _| {
                REVISION.fetch_add(1, Ordering::SeqCst);
            });
        }),
    );

    MountResponse {
        count: u32::try_from(store.customers().len()).unwrap_or(u32::MAX),
        db_path: path.display().to_string(),
        revision: REVISION.load(Ordering::SeqCst),
    }
}

/// Releases the mounted provider. Returns whether one was mounted.
#[flutter_rust_bridge::frb(sync)]
pub fn customers_unmount() -> bool {
    let released = lock_provider().unmount().is_some();
    if released {
        REVISION.fetch_add(1, Ordering::SeqCst);
    }
    released
}

/// Monotonic counter bumped on every list change.
#[flutter_rust_bridge::frb(sync)]
pub fn customers_revision() -> u64 {
    REVISION.load(Ordering::SeqCst)
}

#[flutter_rust_bridge::frb(sync)]
pub fn customers_list() -> CustomerListResponse {
    let provider = lock_provider();
    match provider.use_customers() {
        Ok(store) => {
            let items = store.customers().iter().map(to_customer_item).collect::<Vec<_>>();
            let message = format!("{} customer(s).", items.len());
            CustomerListResponse {
                ok: true,
                items,
                revision: REVISION.load(Ordering::SeqCst),
                message,
            }
        }
        Err(err) => CustomerListResponse {
            ok: false,
            items: Vec::new(),
            revision: REVISION.load(Ordering::SeqCst),
            message: format!("customers_list failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn customers_add(draft: CustomerDraft) -> CustomerActionResponse {
    let data = match to_new_customer(draft) {
        Ok(data) => data,
        Err(message) => return CustomerActionResponse::failure(message),
    };
    match with_store(|store| store.add_customer(data).map_err(|err| err.to_string())) {
        Ok(created) => CustomerActionResponse::success(
            "Customer created.",
            Some(to_customer_item(&created)),
        ),
        Err(message) => CustomerActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn customers_update(id: String, patch: CustomerPatchInput) -> CustomerActionResponse {
    let patch = match to_customer_patch(patch) {
        Ok(patch) => patch,
        Err(message) => return CustomerActionResponse::failure(message),
    };
    match with_store(|store| {
        store
            .update_customer(id.trim(), patch)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => CustomerActionResponse::success("Customer updated.", None),
        Err(message) => CustomerActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn customers_delete(id: String) -> CustomerActionResponse {
    match with_store(|store| {
        store
            .delete_customer(id.trim())
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => CustomerActionResponse::success("Customer deleted.", None),
        Err(message) => CustomerActionResponse::failure(message),
    }
}

fn lock_provider() -> MutexGuard<'static, Provider> {
    // A panic inside a listener must not wedge every later call.
    PROVIDER.lock().unwrap_or_else(|poisoned| {
        warn!("event=provider_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn with_store<T>(
    f: impl FnOnce(&mut CustomerStore<SqliteCustomerRepository>) -> Result<T, String>,
) -> Result<T, String> {
    let mut provider = lock_provider();
    let store = provider
        .use_customers_mut()
        .map_err(|err: ProviderError| err.to_string())?;
    f(store)
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    if let Some(path) = explicit.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    Gender::parse(value).ok_or_else(|| format!("invalid gender `{value}`; expected male|female"))
}

// Add and update share these rules: name/phone/email are trimmed, and blank
// notes mean "no notes".
fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn non_blank_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|notes| !notes.trim().is_empty())
}

fn to_new_customer(draft: CustomerDraft) -> Result<NewCustomer, String> {
    Ok(NewCustomer {
        gender: parse_gender(&draft.gender)?,
        name: trimmed(&draft.name),
        phone: trimmed(&draft.phone),
        email: trimmed(&draft.email),
        preferred_services: draft.preferred_services,
        notes: non_blank_notes(draft.notes),
        photo: draft.photo,
    })
}

fn to_customer_patch(input: CustomerPatchInput) -> Result<CustomerPatch, String> {
    let gender = input.gender.as_deref().map(parse_gender).transpose()?;
    let notes = if input.clear_notes {
        Some(None)
    } else {
        // A blank value clears, matching what the same value does on add.
        input.notes.map(|notes| non_blank_notes(Some(notes)))
    };

    Ok(CustomerPatch {
        name: input.name.as_deref().map(trimmed),
        phone: input.phone.as_deref().map(trimmed),
        email: input.email.as_deref().map(trimmed),
        gender,
        visit_count: input.visit_count,
        total_spent: input.total_spent,
        last_visit: input.last_visit,
        preferred_services: input.preferred_services,
        notes,
        photo: input.photo,
    })
}

fn to_customer_item(customer: &Customer) -> CustomerItem {
    CustomerItem {
        id: customer.id.clone(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        email: customer.email.clone(),
        gender: customer.gender.as_str().to_string(),
        visit_count: customer.visit_count,
        total_spent: customer.total_spent,
        last_visit: customer.last_visit.clone(),
        preferred_services: customer.preferred_services.clone(),
        notes: customer.notes.clone(),
        photo: customer.photo.clone(),
    }
}
