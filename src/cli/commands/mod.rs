//! CLI command implementations.

pub mod batch;
pub mod context;
pub mod feedback;
pub mod plan;
pub mod route;
pub mod run;
pub mod status;
pub mod workflow;

use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::models::Payload;

/// Split repeated `KEY=VALUE` arguments into ordered pairs.
pub fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut parsed = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in '{pair}'");
        }
        parsed.insert(key.to_string(), value.to_string());
    }
    Ok(parsed)
}

/// Build a request context from `KEY=VALUE` arguments. Values that parse as
/// JSON scalars keep their type; everything else is a string.
pub fn parse_context(pairs: &[String]) -> Result<Payload> {
    let mut context = Payload::new();
    for (key, raw) in parse_pairs(pairs)? {
        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
            _ => Value::String(raw),
        };
        context.insert(key, value);
    }
    Ok(context)
}
