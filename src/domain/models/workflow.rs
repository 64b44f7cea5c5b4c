//! Named, parameterised task templates.

use serde::{Deserialize, Serialize};

/// A template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParameter {
    pub name: String,
    pub required: bool,
    /// Used when the caller omits an optional parameter. `None` drops the
    /// placeholder's surrounding clause from the rendered text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl WorkflowParameter {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            default: default.map(str::to_string),
        }
    }
}

/// A named task template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub name: String,
    pub description: String,
    /// Task text with `{param}` placeholders.
    pub template: String,
    pub parameters: Vec<WorkflowParameter>,
}

impl WorkflowTemplate {
    pub fn required_parameters(&self) -> impl Iterator<Item = &WorkflowParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}
