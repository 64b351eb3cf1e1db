//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for contact rows.
//! - Isolate SQLite query details from the store's connection handling.
//!
//! # Invariants
//! - Repository writes must enforce `Contact::validate()` before persistence.
//! - "No matching row" is a value (`false`/`None`), never an error.

pub mod contact_repo;
