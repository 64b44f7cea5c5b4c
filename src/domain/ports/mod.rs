//! Port trait definitions
//!
//! The executor port is the only seam between the pipeline and the
//! capabilities it drives.

pub mod executor;

pub use executor::{Executor, Invocation, InvocationOutcome};
