//! Executor backend implementations.

pub mod command;
pub mod http;
pub mod mock;
pub mod registry;

pub use command::CommandExecutor;
pub use http::HttpExecutor;
pub use mock::{MockBehavior, MockExecutor, SimulatedExecutor};
pub use registry::ExecutorRegistry;
