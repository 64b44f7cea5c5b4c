//! `ada plan`: decompose a request without running it.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt::Write as _;

use crate::cli::commands::parse_context;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, TaskPlan};
use crate::services::{Classification, PatternClassifier, TaskDecomposer};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Task request to decompose
    pub request: String,

    /// Extra context (format: "key=value", repeatable)
    #[arg(short, long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub plan: TaskPlan,
    pub matched_rule: Option<String>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let plan = &self.plan;
        let mut out = String::new();
        let _ = writeln!(out, "Request:  {}", plan.request);
        let _ = writeln!(
            out,
            "Pattern:  {} ({})",
            plan.pattern,
            self.matched_rule.as_deref().unwrap_or("no rule matched")
        );
        let waves: Vec<String> = plan.parallel_groups.iter().map(|w| w.len().to_string()).collect();
        let _ = writeln!(
            out,
            "Waves:    {} [{}]",
            plan.parallel_groups.len(),
            waves.join(", ")
        );
        let _ = writeln!(out, "Estimate: ~{}s", plan.estimated_secs);
        if plan.requires_synthesis {
            let _ = writeln!(out, "Synthesis required");
        }
        if let Some(diagnostic) = &plan.diagnostic {
            let _ = writeln!(out, "Warning:  {}", diagnostic.describe());
        }
        let _ = writeln!(out);
        out.push_str(&TableFormatter::new().format_plan(plan));
        out
    }
}

pub fn build(args: &PlanArgs, config: &Config) -> Result<PlanOutput> {
    let context = parse_context(&args.context)?;
    let classifier = PatternClassifier::from_config(config.classifier.rules.as_deref());
    let Classification { rule, .. } = classifier.explain(&args.request);
    let plan = TaskDecomposer::new(classifier).plan(&args.request, &context);
    Ok(PlanOutput {
        plan,
        matched_rule: rule,
    })
}

pub async fn execute(args: PlanArgs, config: &Config, json_mode: bool) -> Result<()> {
    let result = build(&args, config)?;
    output(&result, json_mode);
    Ok(())
}
