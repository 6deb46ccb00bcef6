use futures::executor::block_on;
use rusqlite::Connection;
use salonbook_core::db::migrations::latest_version;
use salonbook_core::db::open_db_in_memory;
use salonbook_core::{
    CustomerPatch, CustomerRepository, Gender, NewCustomer, RepoError, SqliteCustomerRepository,
};

fn ready_repo() -> SqliteCustomerRepository {
    let mut repo = SqliteCustomerRepository::in_memory();
    block_on(repo.initialize()).unwrap();
    repo
}

fn draft(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        phone: "555".to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        gender: Gender::Male,
        preferred_services: vec!["beard trim".to_string(), "haircut".to_string()],
        notes: None,
        photo: String::new(),
    }
}

#[test]
fn create_assigns_id_and_defaults() {
    let repo = ready_repo();

    let created = repo.create(&draft("Bob")).unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.name, "Bob");
    assert_eq!(created.visit_count, 0);
    assert_eq!(created.total_spent, 0.0);
    assert_eq!(created.last_visit, "");

    let loaded = repo.get_customer(&created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_assigns_distinct_ids() {
    let repo = ready_repo();
    let first = repo.create(&draft("Bob")).unwrap();
    let second = repo.create(&draft("Bob")).unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn get_all_returns_insertion_order() {
    let repo = ready_repo();
    let names = ["Carla", "Ana", "Bob"];
    for name in names {
        repo.create(&draft(name)).unwrap();
    }
    repo.connection()
        .unwrap()
        .execute("UPDATE customers SET created_at = 1234567890000;", [])
        .unwrap();

    let loaded: Vec<String> = repo
        .get_all()
        .unwrap()
        .into_iter()
        .map(|customer| customer.name)
        .collect();
    assert_eq!(loaded, names);
}

#[test]
fn update_merges_patch_and_keeps_other_fields() {
    let repo = ready_repo();
    let created = repo.create(&draft("Ana")).unwrap();

    let patch = CustomerPatch {
        total_spent: Some(150.0),
        visit_count: Some(3),
        notes: Some(Some("allergic to lavender".to_string())),
        ..CustomerPatch::default()
    };
    repo.update(&created.id, &patch).unwrap();

    let loaded = repo.get_customer(&created.id).unwrap().unwrap();
    assert_eq!(loaded.total_spent, 150.0);
    assert_eq!(loaded.visit_count, 3);
    assert_eq!(loaded.notes.as_deref(), Some("allergic to lavender"));
    assert_eq!(loaded.name, created.name);
    assert_eq!(loaded.preferred_services, created.preferred_services);
}

#[test]
fn update_unknown_id_returns_not_found() {
    let repo = ready_repo();
    let err = repo
        .update("missing", &CustomerPatch::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "missing"));
}

#[test]
fn delete_removes_row_and_rejects_unknown_id() {
    let repo = ready_repo();
    let created = repo.create(&draft("Ana")).unwrap();

    repo.delete(&created.id).unwrap();
    assert!(repo.get_customer(&created.id).unwrap().is_none());

    let err = repo.delete(&created.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let repo = ready_repo();

    let err = repo.create(&draft("  ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let created = repo.create(&draft("Ana")).unwrap();
    let patch = CustomerPatch {
        total_spent: Some(-5.0),
        ..CustomerPatch::default()
    };
    let err = repo.update(&created.id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let loaded = repo.get_customer(&created.id).unwrap().unwrap();
    assert_eq!(loaded.total_spent, 0.0);
}

#[test]
fn operations_before_initialize_fail() {
    let repo = SqliteCustomerRepository::in_memory();
    assert!(!repo.is_initialized());
    assert!(matches!(repo.get_all(), Err(RepoError::NotInitialized)));
    assert!(matches!(
        repo.create(&draft("Ana")),
        Err(RepoError::NotInitialized)
    ));
    assert!(matches!(repo.delete("1"), Err(RepoError::NotInitialized)));
}

#[test]
fn initialize_is_idempotent() {
    let mut repo = ready_repo();
    let created = repo.create(&draft("Ana")).unwrap();

    block_on(repo.initialize()).unwrap();
    assert_eq!(repo.get_all().unwrap(), vec![created]);
}

#[test]
fn initialize_file_database_persists_across_repositories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.db");

    let mut first = SqliteCustomerRepository::open(&path);
    block_on(first.initialize()).unwrap();
    let created = first.create(&draft("Ana")).unwrap();
    drop(first);

    let mut second = SqliteCustomerRepository::open(&path);
    block_on(second.initialize()).unwrap();
    assert_eq!(second.get_all().unwrap(), vec![created]);
}

#[test]
fn initialize_fails_for_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = SqliteCustomerRepository::open(dir.path().join("missing").join("x.db"));

    let err = block_on(repo.initialize()).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(!repo.is_initialized());
}

#[test]
fn corrupted_rows_are_reported_not_masked() {
    let repo = ready_repo();
    let created = repo.create(&draft("Ana")).unwrap();
    repo.connection()
        .unwrap()
        .execute(
            "UPDATE customers SET preferred_services = 'not json' WHERE id = ?1;",
            [created.id.as_str()],
        )
        .unwrap();

    let err = repo.get_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains(&created.id)));
}

#[test]
fn from_connection_accepts_migrated_connection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::from_connection(conn).unwrap();
    assert!(repo.is_initialized());
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn from_connection_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteCustomerRepository::from_connection(conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn from_connection_rejects_missing_table_and_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();
    assert!(matches!(
        SqliteCustomerRepository::from_connection(conn),
        Err(RepoError::MissingRequiredTable("customers"))
    ));

    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();
    assert!(matches!(
        SqliteCustomerRepository::from_connection(conn),
        Err(RepoError::MissingRequiredColumn {
            table: "customers",
            column: "phone"
        })
    ));
}
