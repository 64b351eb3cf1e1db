//! Contact store: the public CRUD surface over the `contacts` table.
//!
//! # Responsibility
//! - Bootstrap the schema idempotently.
//! - Scope one SQLite connection to each operation.
//! - Log every operation boundary and return failures to the caller.
//!
//! # Invariants
//! - A connection never outlives the call that opened it, on any exit path.
//! - The store keeps no state between calls besides its `StoreConfig`.
//! - "Not found" is `Ok(false)` / `Ok(None)`; infrastructure failure is `Err`.

use crate::config::StoreConfig;
use crate::db::{open_connection, open_db_with_timeout, DbError};
use crate::model::contact::{Contact, ContactId, StoredContact};
use crate::repo::contact_repo::{ContactRepository, RepoError, RepoResult, SqliteContactRepository};
use log::{error, info, log, Level};
use std::time::Instant;

pub type StoreResult<T> = RepoResult<T>;

/// CRUD access to persisted contacts, keyed by email.
#[derive(Debug, Clone)]
pub struct ContactStore {
    config: StoreConfig,
}

impl ContactStore {
    /// Creates a store without touching the database.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store and bootstraps its schema.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let store = Self::new(config);
        store.initialize()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Ensures the `contacts` table exists. Safe to call on every startup.
    pub fn initialize(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        match open_db_with_timeout(&self.config.db_path, self.config.busy_timeout) {
            Ok(_conn) => {
                info!(
                    "event=store_init module=store status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                let err = RepoError::from(err);
                log_failure("store_init", started_at, &err);
                Err(err)
            }
        }
    }

    /// Inserts a new contact and returns the id the store assigned to it.
    ///
    /// Fails with `DuplicateEmail` when the email is already taken.
    pub fn add(&self, contact: &Contact) -> StoreResult<ContactId> {
        self.with_repo("contact_add", Level::Info, |repo| {
            repo.create_contact(contact)
        })
    }

    /// Deletes the contact with `email`. Returns `false` when none matched.
    pub fn remove(&self, email: &str) -> StoreResult<bool> {
        self.with_repo("contact_remove", Level::Info, |repo| {
            repo.delete_by_email(email)
        })
    }

    /// Returns whether a contact with `email` is stored.
    pub fn exists(&self, email: &str) -> StoreResult<bool> {
        self.with_repo("contact_exists", Level::Debug, |repo| {
            repo.exists_by_email(email)
        })
    }

    /// Overwrites every field of the contact currently stored under `old_email`.
    ///
    /// Returns `false` when no contact matched. Moving onto an email owned by
    /// another contact fails with `DuplicateEmail` and leaves both rows as
    /// they were.
    pub fn update(&self, old_email: &str, updated: &Contact) -> StoreResult<bool> {
        self.with_repo("contact_update", Level::Info, |repo| {
            repo.update_by_email(old_email, updated)
        })
    }

    /// Looks up one contact by email.
    pub fn find(&self, email: &str) -> StoreResult<Option<StoredContact>> {
        self.with_repo("contact_find", Level::Debug, |repo| {
            repo.get_by_email(email)
        })
    }

    /// Returns every stored contact in storage order.
    pub fn list_all(&self) -> StoreResult<Vec<StoredContact>> {
        self.with_repo("contact_list", Level::Debug, |repo| repo.list_contacts())
    }

    fn with_repo<T>(
        &self,
        event: &'static str,
        ok_level: Level,
        op: impl FnOnce(&SqliteContactRepository<'_>) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();

        let result = open_connection(&self.config.db_path, self.config.busy_timeout)
            .map_err(RepoError::from)
            .and_then(|conn| {
                let repo = SqliteContactRepository::try_new(&conn)?;
                op(&repo)
            });

        match &result {
            Ok(_) => log!(
                ok_level,
                "event={} module=store status=ok duration_ms={}",
                event,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure(event, started_at, err),
        }

        result
    }
}

fn log_failure(event: &str, started_at: Instant, err: &RepoError) {
    match err {
        // The message would carry the email itself.
        RepoError::DuplicateEmail(_) => error!(
            "event={} module=store status=error duration_ms={} error_code={}",
            event,
            started_at.elapsed().as_millis(),
            error_code(err)
        ),
        _ => error!(
            "event={} module=store status=error duration_ms={} error_code={} error={}",
            event,
            started_at.elapsed().as_millis(),
            error_code(err),
            err
        ),
    }
}

fn error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "invalid_contact",
        RepoError::DuplicateEmail(_) => "duplicate_email",
        RepoError::UninitializedConnection { .. } => "schema_uninitialized",
        RepoError::InvalidData(_) => "invalid_row",
        RepoError::Db(DbError::Open { .. }) => "db_open_failed",
        RepoError::Db(DbError::UnsupportedSchemaVersion { .. }) => "schema_unsupported",
        RepoError::Db(DbError::Sqlite(_)) => "query_failed",
    }
}

#[cfg(test)]
mod tests {
    use super::{error_code, ContactStore};
    use crate::config::StoreConfig;
    use crate::db::DbError;
    use crate::model::contact::ContactValidationError;
    use crate::repo::contact_repo::RepoError;

    #[test]
    fn error_codes_separate_constraint_from_infrastructure_failures() {
        assert_eq!(
            error_code(&RepoError::DuplicateEmail("a@x.com".to_string())),
            "duplicate_email"
        );
        assert_eq!(
            error_code(&RepoError::Validation(ContactValidationError::InvalidEmail)),
            "invalid_contact"
        );
        assert_eq!(
            error_code(&RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: 9,
                latest_supported: 1,
            })),
            "schema_unsupported"
        );
    }

    #[test]
    fn new_does_not_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.db");

        let store = ContactStore::new(StoreConfig::new(&path));

        assert_eq!(store.config().db_path, path);
        assert!(!path.exists());
    }
}
