use contacts_core::db::DbError;
use contacts_core::{Contact, ContactStore, RepoError, StoreConfig};
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

fn open_store() -> (TempDir, ContactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ContactStore::open(StoreConfig::new(dir.path().join("contacts.db"))).unwrap();
    (dir, store)
}

fn jane() -> Contact {
    Contact::with_phone("Jane", "Doe", "555-1", "jane@x.com")
}

#[test]
fn initialize_twice_keeps_one_table_and_existing_rows() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();

    store.initialize().unwrap();
    store.initialize().unwrap();

    let conn = Connection::open(&store.config().db_path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'contacts';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 1);
    assert_eq!(store.list_all().unwrap().len(), 1);
}

#[test]
fn add_then_list_returns_the_contact_with_an_assigned_id() {
    let (_dir, store) = open_store();

    let id = store.add(&jane()).unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].contact, jane());
}

#[test]
fn first_and_last_name_are_stored_in_their_own_columns() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();

    let conn = Connection::open(&store.config().db_path).unwrap();
    let (first, last): (String, String) = conn
        .query_row(
            "SELECT firstName, lastName FROM contacts WHERE email = 'jane@x.com';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(first, "Jane");
    assert_eq!(last, "Doe");
}

#[test]
fn contact_without_phone_round_trips_as_none() {
    let (_dir, store) = open_store();
    store
        .add(&Contact::new("Ada", "Lovelace", "ada@example.com"))
        .unwrap();

    let found = store.find("ada@example.com").unwrap().unwrap();
    assert_eq!(found.contact.phone, None);
}

#[test]
fn duplicate_email_is_rejected_and_row_count_stays_one() {
    let (_dir, store) = open_store();
    store
        .add(&Contact::new("Alice", "Anders", "a@x.com"))
        .unwrap();

    let err = store
        .add(&Contact::new("Bob", "Brown", "a@x.com"))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateEmail(ref email) if email == "a@x.com"));
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].contact.first_name, "Alice");
}

#[test]
fn invalid_contact_is_rejected_before_any_write() {
    let (_dir, store) = open_store();

    let err = store
        .add(&Contact::new("", "Doe", "jane@x.com"))
        .unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn exists_follows_add_and_remove() {
    let (_dir, store) = open_store();
    assert!(!store.exists("jane@x.com").unwrap());

    store.add(&jane()).unwrap();
    assert!(store.exists("jane@x.com").unwrap());

    assert!(store.remove("jane@x.com").unwrap());
    assert!(!store.exists("jane@x.com").unwrap());
}

#[test]
fn remove_unknown_email_returns_false_and_changes_nothing() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();
    let before = store.list_all().unwrap();

    assert!(!store.remove("nobody@x.com").unwrap());

    assert_eq!(store.list_all().unwrap(), before);
}

#[test]
fn update_moves_contact_to_new_email() {
    let (_dir, store) = open_store();
    let id = store
        .add(&Contact::new("Alice", "Anders", "a@x.com"))
        .unwrap();

    let updated = Contact::with_phone("Carol", "Clark", "555-3", "c@x.com");
    assert!(store.update("a@x.com", &updated).unwrap());

    assert!(!store.exists("a@x.com").unwrap());
    assert!(store.exists("c@x.com").unwrap());
    let found = store.find("c@x.com").unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.contact, updated);
}

#[test]
fn update_can_clear_phone_and_keep_email() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();

    let updated = Contact::new("Janet", "Doe", "jane@x.com");
    assert!(store.update("jane@x.com", &updated).unwrap());

    let found = store.find("jane@x.com").unwrap().unwrap();
    assert_eq!(found.contact, updated);
}

#[test]
fn update_unknown_email_returns_false() {
    let (_dir, store) = open_store();

    let updated = Contact::new("Carol", "Clark", "c@x.com");
    assert!(!store.update("missing@x.com", &updated).unwrap());
    assert!(!store.exists("c@x.com").unwrap());
}

#[test]
fn update_onto_another_contacts_email_is_rejected() {
    let (_dir, store) = open_store();
    store
        .add(&Contact::new("Alice", "Anders", "a@x.com"))
        .unwrap();
    store
        .add(&Contact::new("Bob", "Brown", "b@x.com"))
        .unwrap();
    let before = store.list_all().unwrap();

    let err = store
        .update("a@x.com", &Contact::new("Alice", "Anders", "b@x.com"))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateEmail(ref email) if email == "b@x.com"));
    assert_eq!(store.list_all().unwrap(), before);
}

#[test]
fn list_all_on_empty_table_is_empty() {
    let (_dir, store) = open_store();
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn operations_without_initialization_fail_instead_of_returning_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-initialized.db");
    let store = ContactStore::new(StoreConfig::new(&path));

    let err = store.exists("jane@x.com").unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Open { .. })));
    assert!(store.list_all().is_err());
    assert!(!Path::new(&path).exists());
}

#[test]
fn operations_on_a_database_without_schema_report_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER);")
        .unwrap();
    let store = ContactStore::new(StoreConfig::new(&path));

    let err = store.remove("jane@x.com").unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn initialize_fails_when_database_path_is_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContactStore::new(StoreConfig::new(dir.path()));

    let err = store.initialize().unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn separate_store_handles_share_the_same_file() {
    let (_dir, store) = open_store();
    let other = ContactStore::new(store.config().clone());

    store.add(&jane()).unwrap();

    assert!(other.exists("jane@x.com").unwrap());
    assert!(other.remove("jane@x.com").unwrap());
    assert!(!store.exists("jane@x.com").unwrap());
}

#[test]
fn rows_written_outside_the_store_are_listed_found_and_updatable() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();
    Connection::open(&store.config().db_path)
        .unwrap()
        .execute(
            "INSERT INTO contacts (firstName, lastName, phone, email)
             VALUES ('Root', 'Admin', NULL, 'admin@localhost');",
            [],
        )
        .unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 2);
    let admin = store.find("admin@localhost").unwrap().unwrap();
    assert_eq!(admin.contact, Contact::new("Root", "Admin", "admin@localhost"));

    let renamed = Contact::with_phone("Root", "Operator", "555-0", "admin@localhost");
    assert!(store.update("admin@localhost", &renamed).unwrap());
    assert_eq!(store.find("admin@localhost").unwrap().unwrap().contact, renamed);
}

#[test]
fn new_emails_still_need_a_domain_shape() {
    let (_dir, store) = open_store();
    store.add(&jane()).unwrap();

    let err = store
        .add(&Contact::new("Root", "Admin", "admin@localhost"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = store
        .update("jane@x.com", &Contact::new("Jane", "Doe", "jane@localhost"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.exists("jane@x.com").unwrap());
}

#[test]
fn update_adds_phone_while_keeping_email() {
    let (_dir, store) = open_store();
    let id = store
        .add(&Contact::new("Ada", "Lovelace", "ada@example.com"))
        .unwrap();

    let with_phone = Contact::with_phone("Ada", "Lovelace", "555-2", "ada@example.com");
    assert!(store.update("ada@example.com", &with_phone).unwrap());

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].contact.phone.as_deref(), Some("555-2"));
}
