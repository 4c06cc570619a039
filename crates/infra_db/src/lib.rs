//! Infrastructure Database Layer
//!
//! PostgreSQL implementation of the admission record store and settlement
//! procedure, built on SQLx.
//!
//! # Architecture
//!
//! - `repositories`: SQL over the admission tables, row types only
//! - `adapters`: port implementations converting rows to domain types
//! - `pool`: connection pool creation and embedded migrations
//!
//! All work of one assurance call happens on a single `sqlx::Transaction`;
//! the settlement function runs on that same connection so that an account
//! it opens is rolled back with everything else.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig};
//! use infra_db::adapters::{PostgresRecordStore, PostgresSettlementProcedure};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/admission")).await?;
//! let store = PostgresRecordStore::new(pool);
//! let procedure = PostgresSettlementProcedure::new();
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresRecordStore, PostgresRecordTransaction, PostgresSettlementProcedure};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
