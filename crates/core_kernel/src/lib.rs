//! Core Kernel - Foundational types shared by the admission system
//!
//! This crate provides the building blocks used across the workspace:
//! - Trimmed, string-keyed identifiers for episodes, patients, accounts and operators
//! - The port error type and health-check contract used by every adapter
//! - A local calendar for producing admission dates and times in the hospital timezone

pub mod identifiers;
pub mod temporal;
pub mod ports;
pub mod error;

pub use identifiers::{EpisodeId, PatientId, AccountId, OperatorId, IdentifierError};
pub use temporal::{Clock, SystemClock, FixedClock, LocalCalendar, Timezone};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
};
pub use error::CoreError;
