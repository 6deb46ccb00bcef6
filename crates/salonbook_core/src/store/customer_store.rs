//! Observable in-memory customer list backed by a [`CustomerRepository`].
//!
//! # Responsibility
//! - Load the full record set once on activation.
//! - Forward create/update/delete to the repository and mirror each
//!   successful write into the in-memory list.
//! - Notify subscribed listeners after every successful load or mutation.
//!
//! # Invariants
//! - The list is never touched before the repository call succeeds; a failed
//!   mutation leaves it exactly as it was.
//! - Order is the repository's load order with new records appended; updates
//!   never reorder.
//! - Load failures are logged and swallowed; the list stays empty.

use crate::model::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
use crate::repo::customer_repo::{CustomerRepository, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Store operation that produced a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    AddCustomer,
    UpdateCustomer,
    DeleteCustomer,
}

impl StoreOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddCustomer => "add_customer",
            Self::UpdateCustomer => "update_customer",
            Self::DeleteCustomer => "delete_customer",
        }
    }
}

/// Recoverable storage failure surfaced to the mutation caller.
#[derive(Debug)]
pub struct StoreError {
    pub op: StoreOp,
    pub source: RepoError,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.op.as_str(), self.source)
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Change notification delivered to listeners.
///
/// Mutation events report a successful repository write, not a change to the
/// list: when the repository accepts an id the list does not hold,
/// `Updated`/`Deleted` still fire and listeners see the list unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Loaded { count: usize },
    Added(CustomerId),
    Updated(CustomerId),
    Deleted(CustomerId),
}

/// Handle returned by [`CustomerStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StoreEvent, &[Customer]) + Send>;

pub struct CustomerStore<R: CustomerRepository> {
    repo: R,
    customers: Vec<Customer>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    activated: bool,
}

impl<R: CustomerRepository> CustomerStore<R> {
    /// Creates an inactive store with an empty list.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            customers: Vec::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            activated: false,
        }
    }

    /// Initializes the repository and loads every record.
    ///
    /// Runs at most once per store. Failures are logged and never returned;
    /// the list then stays empty and listeners are not notified.
    pub async fn activate(&mut self) {
        if self.activated {
            warn!("event=customers_load module=store status=skipped reason=already_activated");
            return;
        }
        self.activated = true;

        let started_at = Instant::now();
        info!("event=customers_load module=store status=start");

        if let Err(err) = self.repo.initialize().await {
            error!(
                "event=customers_load module=store status=error duration_ms={} error_code=db_init_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return;
        }

        match self.repo.get_all() {
            Ok(customers) => {
                self.customers = customers;
                info!(
                    "event=customers_load module=store status=ok duration_ms={} count={}",
                    started_at.elapsed().as_millis(),
                    self.customers.len()
                );
                self.notify(StoreEvent::Loaded {
                    count: self.customers.len(),
                });
            }
            Err(err) => {
                error!(
                    "event=customers_load module=store status=error duration_ms={} error_code=load_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
            }
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Current records in list order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a record and appends the repository's returned copy.
    pub fn add_customer(&mut self, data: NewCustomer) -> StoreResult<Customer> {
        let created = self
            .repo
            .create(&data)
            .map_err(|err| fail(StoreOp::AddCustomer, None, err))?;

        self.customers.push(created.clone());
        self.notify(StoreEvent::Added(created.id.clone()));
        Ok(created)
    }

    /// Persists `patch` and shallow-merges it onto the matching in-memory record.
    ///
    /// An id missing from the list only affects the repository call; the
    /// `Updated` event is still emitted.
    pub fn update_customer(&mut self, id: &str, patch: CustomerPatch) -> StoreResult<()> {
        self.repo
            .update(id, &patch)
            .map_err(|err| fail(StoreOp::UpdateCustomer, Some(id), err))?;

        if let Some(customer) = self.customers.iter_mut().find(|customer| customer.id == id) {
            patch.apply_to(customer);
        }
        self.notify(StoreEvent::Updated(id.to_string()));
        Ok(())
    }

    /// Deletes the record in the repository and drops it from the list.
    ///
    /// Emits `Deleted` once the repository succeeds, whether or not the id
    /// was in the list.
    pub fn delete_customer(&mut self, id: &str) -> StoreResult<()> {
        self.repo
            .delete(id)
            .map_err(|err| fail(StoreOp::DeleteCustomer, Some(id), err))?;

        self.customers.retain(|customer| customer.id != id);
        self.notify(StoreEvent::Deleted(id.to_string()));
        Ok(())
    }

    /// Registers a listener called with each event and the list after it.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreEvent, &[Customer]) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(current, _)| *current != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event, &self.customers);
        }
    }
}

fn fail(op: StoreOp, id: Option<&str>, source: RepoError) -> StoreError {
    error!(
        "event={} module=store status=error customer_id={} error={}",
        op.as_str(),
        id.unwrap_or("-"),
        source
    );
    StoreError { op, source }
}
