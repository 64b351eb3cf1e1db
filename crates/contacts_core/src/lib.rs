//! Core data-access layer for the contacts store.
//! This crate owns the `contacts` table and every rule about its rows.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{StoreConfig, DEFAULT_BUSY_TIMEOUT, DEFAULT_DB_FILE_NAME};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, ContactValidationError, StoredContact};
pub use repo::contact_repo::{
    ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
pub use store::{ContactStore, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
