//! Contact repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `contacts` table keyed by email.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every statement is parameterized.
//! - Unique-constraint failures on `email` surface as `DuplicateEmail`.
//! - Read paths return rows as stored; only a column whose type does not
//!   match the schema is reported as `InvalidData`.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::contact::{Contact, ContactId, ContactValidationError, StoredContact};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    firstName,
    lastName,
    phone,
    email
FROM contacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    /// Another row already owns this email.
    DuplicateEmail(String),
    /// The connection's schema was never bootstrapped to the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => {
                write!(f, "a contact with email `{email}` already exists")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "contacts schema is not initialized (version {actual_version}, expected {expected_version})"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateEmail(_)
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
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

/// Repository interface for contact CRUD operations keyed by email.
pub trait ContactRepository {
    fn create_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    fn delete_by_email(&self, email: &str) -> RepoResult<bool>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    fn update_by_email(&self, old_email: &str, updated: &Contact) -> RepoResult<bool>;
    fn get_by_email(&self, email: &str) -> RepoResult<Option<StoredContact>>;
    fn list_contacts(&self) -> RepoResult<Vec<StoredContact>>;
}

/// SQLite-backed contact repository over one borrowed connection.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Wraps a connection whose schema is already at the latest version.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        contact.validate()?;

        self.conn
            .execute(
                "INSERT INTO contacts (firstName, lastName, phone, email)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    contact.first_name.as_str(),
                    contact.last_name.as_str(),
                    contact.phone.as_deref(),
                    contact.email.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, &contact.email))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn delete_by_email(&self, email: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE email = ?1;", [email])?;
        Ok(changed > 0)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE email = ?1);",
            [email],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn update_by_email(&self, old_email: &str, updated: &Contact) -> RepoResult<bool> {
        if updated.email == old_email {
            updated.validate_fields()?;
        } else {
            updated.validate()?;
        }

        let changed = self
            .conn
            .execute(
                "UPDATE contacts
                 SET
                    firstName = ?1,
                    lastName = ?2,
                    phone = ?3,
                    email = ?4
                 WHERE email = ?5;",
                params![
                    updated.first_name.as_str(),
                    updated.last_name.as_str(),
                    updated.phone.as_deref(),
                    updated.email.as_str(),
                    old_email,
                ],
            )
            .map_err(|err| map_write_error(err, &updated.email))?;

        Ok(changed > 0)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<StoredContact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE email = ?1;"))?;
        let stored = stmt
            .query_row([email], read_contact)
            .optional()
            .map_err(map_read_error)?;
        Ok(stored)
    }

    fn list_contacts(&self) -> RepoResult<Vec<StoredContact>> {
        let mut stmt = self.conn.prepare(&format!("{CONTACT_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(read_contact(row).map_err(map_read_error)?);
        }

        Ok(contacts)
    }
}

fn read_contact(row: &Row<'_>) -> rusqlite::Result<StoredContact> {
    Ok(StoredContact {
        id: row.get("id")?,
        contact: Contact {
            first_name: row.get("firstName")?,
            last_name: row.get("lastName")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
        },
    })
}

fn map_read_error(err: rusqlite::Error) -> RepoError {
    match err {
        rusqlite::Error::InvalidColumnType(_, column, kind) => RepoError::InvalidData(format!(
            "contacts.{column} holds a {kind} value where text was expected"
        )),
        rusqlite::Error::FromSqlConversionFailure(_, kind, source) => {
            RepoError::InvalidData(format!("cannot convert {kind} value: {source}"))
        }
        other => other.into(),
    }
}

fn map_write_error(err: rusqlite::Error, email: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::DuplicateEmail(email.to_string());
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation
                && inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
