//! Domain Adapters
//!
//! Adapter implementations for the admission domain ports, connecting them
//! to the PostgreSQL database layer.
//!
//! Each adapter:
//! - Implements a port trait from `domain_admission`
//! - Translates between domain types and database row types
//! - Uses `repositories::admission` for the SQL itself

pub mod admission;

pub use admission::{PostgresRecordStore, PostgresRecordTransaction, PostgresSettlementProcedure};
