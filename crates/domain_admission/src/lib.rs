//! Admission Domain - Hospitalization Account Assurance
//!
//! This crate guarantees that a hospitalization episode is linked to exactly
//! one active billing account, opening that account through the legacy
//! settlement procedure only when the episode's insurance requires it.
//!
//! # Components
//!
//! - **Insurance classifier** (`insurance`): maps an insurance code to a settlement decision
//! - **Account resolver** (`resolver`): picks the patient's current active account
//! - **Settlement invoker** (`settlement`): calls the settlement procedure and interprets its reply
//! - **Orchestrator** (`assurance`): runs the whole workflow inside one store transaction
//!
//! Storage and the settlement procedure are reached only through the traits in
//! `ports`, so the workflow runs unchanged against PostgreSQL or the in-memory
//! adapter.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_admission::{AccountAssuranceService, AssuranceConfig, AssuranceInput};
//!
//! let service = AccountAssuranceService::new(store, procedure, calendar, AssuranceConfig::default());
//! let result = service.assure_account("H-1001 ", &input).await?;
//! println!("{} -> {:?}", result.tag(), result.account_id());
//! ```

pub mod account;
pub mod adapters;
pub mod assurance;
pub mod episode;
pub mod error;
pub mod insurance;
pub mod ports;
pub mod resolver;
pub mod settlement;

pub use account::{AccountStatus, BillingAccount};
pub use assurance::{
    AccountAssurance, AccountAssuranceService, AssuranceConfig, AssuranceInput, AssuranceResult,
};
pub use episode::{EpisodeBillingProfile, HospitalizationEpisode};
pub use error::AssuranceError;
pub use insurance::{classify, InsuranceEligibility, InsurancePlan};
pub use ports::{RecordStore, RecordTransaction, SettlementProcedure};
pub use resolver::AccountResolver;
pub use settlement::{
    ProcedureReply, ProcedureRow, SettlementDefaults, SettlementInvoker, SettlementOutcome,
    SettlementRequest, StaffOrigin,
};
