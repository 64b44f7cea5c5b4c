//! Executor outputs and the lenient payload type they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix carried by concrete executor names that alias a base capability
/// (`duplicate-detector-ion` is the concrete form of `duplicate-detector`).
pub const ALIAS_SUFFIX: &str = "-ion";

/// Strip the alias suffix from an executor name.
pub fn base_name(executor: &str) -> &str {
    executor.strip_suffix(ALIAS_SUFFIX).unwrap_or(executor)
}

/// An untyped mapping of named values.
///
/// Every read goes through a default-valued accessor, so consumers never fail
/// on a missing or mistyped key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// View an arbitrary JSON value as a payload. Non-object values are
    /// wrapped under a `value` key.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::default(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self(map)
            }
        }
    }

    /// Borrowing variant of [`Payload::from_value`] for nested objects.
    pub fn view(value: &Value) -> Self {
        value
            .as_object()
            .map_or_else(Self::default, |map| Self(map.clone()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn extend(&mut self, other: &Self) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Unsigned integer at `key`. Floats are truncated, numeric strings parsed.
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.f64_opt(key).unwrap_or(default)
    }

    pub fn f64_opt(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.str_opt(key).unwrap_or_else(|| default.to_string())
    }

    /// String at `key`; numbers and booleans are rendered, other shapes ignored.
    pub fn str_opt(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Array at `key`, or an empty slice.
    pub fn array(&self, key: &str) -> &[Value] {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Nested object at `key`, or an empty payload.
    pub fn object(&self, key: &str) -> Self {
        self.0.get(key).map_or_else(Self::default, Self::view)
    }

    /// Count at `key`: a number is taken as-is, an array by its length.
    pub fn count_or(&self, key: &str, default: u64) -> u64 {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.len() as u64,
            Some(_) => self.u64_or(key, default),
            None => default,
        }
    }

    /// Strings at `key`. Non-string items are rendered through [`display_value`].
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.array(key).iter().map(display_value).collect()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        payload.into_value()
    }
}

/// Render a JSON value for human display: strings unquoted, objects by their
/// `name`/`title`/`description` field when present.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["name", "title", "description", "question"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map_or_else(|| value.to_string(), str::to_string),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The result of one subtask attempt.
///
/// Produced exactly once per subtask, including the synthetic timeout and
/// exception outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOutput {
    pub subtask_id: String,
    pub executor: String,
    pub description: String,
    pub success: bool,
    #[serde(default)]
    pub result: Payload,
    pub execution_time_ms: u64,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error text recorded for subtasks cut off by a wave budget.
pub const TIMEOUT_ERROR: &str = "Execution timeout";

impl ExecutorOutput {
    pub fn succeeded(
        subtask_id: impl Into<String>,
        executor: impl Into<String>,
        description: impl Into<String>,
        result: Payload,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            subtask_id: subtask_id.into(),
            executor: executor.into(),
            description: description.into(),
            success: true,
            result,
            execution_time_ms,
            completed_at: Utc::now(),
            error: None,
        }
    }

    pub fn failed(
        subtask_id: impl Into<String>,
        executor: impl Into<String>,
        description: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        let error = error.into();
        Self {
            subtask_id: subtask_id.into(),
            executor: executor.into(),
            description: description.into(),
            success: false,
            result: Payload::new().with("error", error.clone()),
            execution_time_ms,
            completed_at: Utc::now(),
            error: Some(error),
        }
    }

    /// Synthetic output for a subtask still pending when its wave budget ran out.
    pub fn timed_out(
        subtask_id: impl Into<String>,
        executor: impl Into<String>,
        description: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        let mut output = Self::failed(subtask_id, executor, description, TIMEOUT_ERROR, execution_time_ms);
        output.result = Payload::new().with("error", "Timeout");
        output
    }

    /// Replace the completion timestamp. Used by tests and replay tooling that
    /// need deterministic outputs.
    #[must_use]
    pub const fn at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = completed_at;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.error.as_deref() == Some(TIMEOUT_ERROR)
    }

    /// Executor name with any alias suffix removed.
    pub fn base_name(&self) -> &str {
        base_name(&self.executor)
    }

    /// Tokens the executor reported consuming, if any.
    pub fn tokens_used(&self) -> Option<u64> {
        self.result
            .contains_key("tokens_used")
            .then(|| self.result.u64_or("tokens_used", 0))
    }
}
