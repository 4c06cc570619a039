//! Repository implementations
//!
//! Repositories encapsulate SQL and map between database rows and plain row
//! types. They borrow the connection of the caller's transaction and never
//! commit on their own.

pub mod admission;

pub use admission::AdmissionRepository;
