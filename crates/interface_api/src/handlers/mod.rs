//! Request handlers

pub mod admission;
pub mod health;
