//! Executor port - the boundary to downstream capabilities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::Payload;

/// A single call to a named executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Concrete executor name (aliases already applied).
    pub executor: String,
    pub subtask_id: String,
    pub description: String,
    pub input: Payload,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Successful results of earlier waves, keyed by executor base name.
    #[serde(default)]
    pub prior_results: BTreeMap<String, Payload>,
}

/// What an executor reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub success: bool,
    #[serde(default)]
    pub result: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl InvocationOutcome {
    pub fn ok(result: Payload, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            result,
            error: None,
            execution_time_ms,
        }
    }

    pub fn failed(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            result: Payload::new(),
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}

/// Trait for executor backends.
///
/// An executor is an opaque capability invoked by name. `Err` means the call
/// itself broke (transport, spawn, protocol); a capability that ran and did
/// not succeed reports `Ok` with `success: false`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Backend type name.
    fn name(&self) -> &'static str;

    /// Invoke one executor.
    async fn invoke(&self, invocation: Invocation) -> DomainResult<InvocationOutcome>;
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_wire_format() {
        let inv = Invocation {
            executor: "omnisearch".into(),
            subtask_id: "omnisearch_001".into(),
            description: "Search".into(),
            input: Payload::new().with("query", "rust"),
            timeout: Duration::from_millis(1500),
            prior_results: BTreeMap::new(),
        };
        let json = serde_json::to_value(&inv).unwrap();
        assert_eq!(json["timeout"], 1.5);
        assert_eq!(json["input"]["query"], "rust");
    }

    #[test]
    fn test_outcome_parses_minimal_body() {
        let outcome: InvocationOutcome = serde_json::from_str(r#"{"success": false, "error": "nope"}"#).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("nope"));
        assert!(outcome.result.is_empty());
    }
}
