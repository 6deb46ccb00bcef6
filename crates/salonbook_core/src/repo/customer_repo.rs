//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the backing-store contract consumed by the customer store.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Customer::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `get_all` returns rows in insertion order.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::customer::{
    Customer, CustomerId, CustomerPatch, CustomerValidationError, Gender, NewCustomer,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone,
    email,
    gender,
    visit_count,
    total_spent,
    last_visit,
    preferred_services,
    notes,
    photo
FROM customers";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "name",
    "phone",
    "email",
    "gender",
    "visit_count",
    "total_spent",
    "last_visit",
    "preferred_services",
    "notes",
    "photo",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Backing-store error for customer persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CustomerValidationError),
    Db(DbError),
    NotFound(CustomerId),
    /// An operation ran before `initialize` succeeded.
    NotInitialized,
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "customer not found: {id}"),
            Self::NotInitialized => write!(f, "customer database is not initialized"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "customer repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "customer repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "customer repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CustomerValidationError> for RepoError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Backing store consumed by [`crate::store::CustomerStore`].
///
/// Only `initialize` suspends; every other call completes before returning.
/// Behavior for unknown ids in `update`/`delete` is implementation-defined.
#[allow(async_fn_in_trait)]
pub trait CustomerRepository {
    async fn initialize(&mut self) -> RepoResult<()>;
    fn get_all(&self) -> RepoResult<Vec<Customer>>;
    /// Persists `data`, assigning the id and defaults for omitted fields.
    fn create(&self, data: &NewCustomer) -> RepoResult<Customer>;
    fn update(&self, id: &str, patch: &CustomerPatch) -> RepoResult<()>;
    fn delete(&self, id: &str) -> RepoResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DbTarget {
    File(PathBuf),
    Memory,
}

/// SQLite-backed customer repository.
///
/// Holds no connection until [`CustomerRepository::initialize`] opens and
/// migrates the target database.
pub struct SqliteCustomerRepository {
    target: DbTarget,
    conn: Option<Connection>,
}

impl SqliteCustomerRepository {
    /// Repository over a database file, opened on `initialize`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            target: DbTarget::File(path.into()),
            conn: None,
        }
    }

    /// Repository over a private in-memory database, opened on `initialize`.
    pub fn in_memory() -> Self {
        Self {
            target: DbTarget::Memory,
            conn: None,
        }
    }

    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        ensure_customer_connection_ready(&conn)?;
        Ok(Self {
            target: DbTarget::Memory,
            conn: Some(conn),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.conn.is_some()
    }

    /// Direct connection access for diagnostics and tests.
    pub fn connection(&self) -> RepoResult<&Connection> {
        self.conn.as_ref().ok_or(RepoError::NotInitialized)
    }

    /// Loads one customer by id.
    pub fn get_customer(&self, id: &str) -> RepoResult<Option<Customer>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_customer_row(row)?)),
            None => Ok(None),
        }
    }
}

impl CustomerRepository for SqliteCustomerRepository {
    async fn initialize(&mut self) -> RepoResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = match &self.target {
            DbTarget::File(path) => open_db(path)?,
            DbTarget::Memory => open_db_in_memory()?,
        };
        ensure_customer_connection_ready(&conn)?;
        self.conn = Some(conn);
        Ok(())
    }

    fn get_all(&self) -> RepoResult<Vec<Customer>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{CUSTOMER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();

        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }

        Ok(customers)
    }

    fn create(&self, data: &NewCustomer) -> RepoResult<Customer> {
        let conn = self.connection()?;
        let customer = data.clone().into_customer(Uuid::new_v4().to_string());
        customer.validate()?;

        conn.execute(
            "INSERT INTO customers (
                id,
                name,
                phone,
                email,
                gender,
                visit_count,
                total_spent,
                last_visit,
                preferred_services,
                notes,
                photo
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                customer.id.as_str(),
                customer.name.as_str(),
                customer.phone.as_str(),
                customer.email.as_str(),
                customer.gender.as_str(),
                customer.visit_count,
                customer.total_spent,
                customer.last_visit.as_str(),
                encode_services(&customer.preferred_services)?,
                customer.notes.as_deref(),
                customer.photo.as_str(),
            ],
        )?;

        debug!(
            "event=customer_create module=repo status=ok customer_id={}",
            customer.id
        );
        Ok(customer)
    }

    fn update(&self, id: &str, patch: &CustomerPatch) -> RepoResult<()> {
        let conn = self.connection()?;
        let mut customer = self
            .get_customer(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        patch.apply_to(&mut customer);
        customer.validate()?;

        let changed = conn.execute(
            "UPDATE customers
             SET
                name = ?1,
                phone = ?2,
                email = ?3,
                gender = ?4,
                visit_count = ?5,
                total_spent = ?6,
                last_visit = ?7,
                preferred_services = ?8,
                notes = ?9,
                photo = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?11;",
            params![
                customer.name.as_str(),
                customer.phone.as_str(),
                customer.email.as_str(),
                customer.gender.as_str(),
                customer.visit_count,
                customer.total_spent,
                customer.last_visit.as_str(),
                encode_services(&customer.preferred_services)?,
                customer.notes.as_deref(),
                customer.photo.as_str(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .connection()?
            .execute("DELETE FROM customers WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    let id: String = row.get("id")?;

    let gender_text: String = row.get("gender")?;
    let gender = Gender::parse(&gender_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid gender `{gender_text}` in customers.gender for {id}"
        ))
    })?;

    let services_text: String = row.get("preferred_services")?;
    let preferred_services = serde_json::from_str::<Vec<String>>(&services_text)
        .map_err(|err| RepoError::InvalidData(format!("invalid preferred_services for {id}: {err}")))?;

    let visit_count = row.get::<_, i64>("visit_count")?;
    let visit_count = u32::try_from(visit_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid visit_count `{visit_count}` in customers.visit_count for {id}"
        ))
    })?;

    let customer = Customer {
        id,
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        gender,
        visit_count,
        total_spent: row.get("total_spent")?,
        last_visit: row.get("last_visit")?,
        preferred_services,
        notes: row.get("notes")?,
        photo: row.get("photo")?,
    };
    customer.validate()?;
    Ok(customer)
}

fn encode_services(services: &[String]) -> RepoResult<String> {
    serde_json::to_string(services)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode preferred_services: {err}")))
}

fn ensure_customer_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "customers")? {
        return Err(RepoError::MissingRequiredTable("customers"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "customers", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "customers",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
