//! Adapters for the executor port.

pub mod executors;
