//! Adapters bundled with the admission domain
//!
//! # Available Adapters
//!
//! - **InMemoryRecordStore**: transactional in-memory record store
//! - **ScriptedSettlement**: settlement procedure double answering from a script
//!
//! The PostgreSQL adapters live in `infra_db`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_admission::adapters::{InMemoryRecordStore, ScriptedSettlement};
//!
//! let store = InMemoryRecordStore::new();
//! let settlement = Arc::new(ScriptedSettlement::opening(["A900"]));
//! let service = AccountAssuranceService::new(store.clone(), settlement.clone(), calendar, config);
//! ```

pub mod memory;

pub use memory::{FailurePoint, InMemoryRecordStore, MemoryTransaction, ScriptedReply, ScriptedSettlement};
