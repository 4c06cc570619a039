//! Request and response bodies

pub mod admission;
