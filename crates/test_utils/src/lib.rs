//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the admission
//! test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed identifiers, instants and calendars
//! - `builders`: Builders for episodes, accounts and assurance input
//! - `database`: PostgreSQL test containers and seeding helpers
//! - `assertions`: Assertions over assurance results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
