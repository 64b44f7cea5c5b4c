//! Subtasks: the unit of work bound to a named executor.

use serde::{Deserialize, Serialize};

use super::output::Payload;

/// Default priority assigned by builders that do not set one.
pub const DEFAULT_PRIORITY: u32 = 3;

/// One unit of work in a task plan.
///
/// Dependencies refer to other subtasks in the same plan by identity. A
/// subtask with no dependencies is always eligible for the first wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique within a plan.
    pub id: String,
    /// Target executor. `None` means the adaptive router picks one at dispatch.
    pub executor: Option<String>,
    pub description: String,
    #[serde(default)]
    pub input: Payload,
    /// Lower is more urgent.
    pub priority: u32,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub can_parallelize: bool,
    pub estimated_secs: u64,
}

impl Subtask {
    pub fn new(
        id: impl Into<String>,
        executor: Option<&str>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            executor: executor.map(str::to_string),
            description: description.into(),
            input: Payload::new(),
            priority: DEFAULT_PRIORITY,
            depends_on: Vec::new(),
            can_parallelize: true,
            estimated_secs: 5,
        }
    }

    #[must_use]
    pub fn with_input(mut self, input: Payload) -> Self {
        self.input = input;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.can_parallelize = false;
        self
    }

    #[must_use]
    pub const fn with_estimate(mut self, secs: u64) -> Self {
        self.estimated_secs = secs;
        self
    }

    /// Executor name for display, `unbound` when the router decides.
    pub fn executor_label(&self) -> &str {
        self.executor.as_deref().unwrap_or("unbound")
    }
}
