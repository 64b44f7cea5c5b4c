//! Domain layer for the ADA pipeline
//!
//! Core models, errors and the executor port. Nothing here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
