//! `ada route`: show how the router ranks executors for some content.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::context::{build_router, open_feedback};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::Config;
use crate::services::RouteDecision;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Content or request text to route
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RouteOutput(pub RouteDecision);

impl CommandOutput for RouteOutput {
    fn to_human(&self) -> String {
        let decision = &self.0;
        let mut out = format!(
            "Category: {}  Capability: {}\n",
            decision.category, decision.capability
        );
        if decision.fallback_used {
            out.push_str(&format!(
                "No route matched; falling back to {}\n",
                decision.executors.join(", ")
            ));
        } else {
            out.push_str(&TableFormatter::new().format_route(decision));
        }
        out
    }
}

pub async fn execute(args: RouteArgs, config: &Config, json_mode: bool) -> Result<()> {
    let feedback = open_feedback(config).await?;
    let router = build_router(config, &feedback).await;
    let decision = router.route_detailed(args.content.as_str());
    output(&RouteOutput(decision), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AdaptiveRouter;

    #[test]
    fn test_fallback_is_reported() {
        let decision = AdaptiveRouter::new(vec![], 0.1, "general-learning-agent").route_detailed("");
        assert!(decision.fallback_used);
        let human = RouteOutput(decision).to_human();
        assert!(human.contains("falling back to general-learning-agent"));
    }

    #[test]
    fn test_json_is_the_bare_decision() {
        let decision = AdaptiveRouter::with_defaults().route_detailed("search for tutorials");
        let json = RouteOutput(decision).to_json();
        assert_eq!(json["category"], "search_query");
        assert!(json["executors"].as_array().is_some_and(|e| !e.is_empty()));
    }
}
