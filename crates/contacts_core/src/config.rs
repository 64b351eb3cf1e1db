//! Store configuration injected at construction time.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database file used when the caller does not pick one.
pub const DEFAULT_DB_FILE_NAME: &str = "contacts.db";

/// How long a connection waits on a locked database unless configured otherwise.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for a [`crate::ContactStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file. Relative paths resolve against the working directory.
    pub db_path: PathBuf,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_FILE_NAME)
    }
}
