//! Domain model for stored contacts.
//!
//! # Responsibility
//! - Define the contact value passed into and returned from the store.
//! - Own field-level validation rules.
//!
//! # Invariants
//! - `email` is the business key; row identity stays inside the store.

pub mod contact;
