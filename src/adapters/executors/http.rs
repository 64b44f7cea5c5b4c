//! HTTP gateway executor.
//!
//! POSTs each [`Invocation`] as JSON to `{base_url}/executors/{name}/invoke`
//! and expects an [`InvocationOutcome`] back.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::HttpExecutorConfig;
use crate::domain::ports::{Executor, Invocation, InvocationOutcome};

/// HTTP client for an executor gateway.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpExecutor {
    pub fn new(config: &HttpExecutorConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ada/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::ValidationFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, executor: &str) -> String {
        format!("{}/executors/{executor}/invoke", self.base_url)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn invoke(&self, invocation: Invocation) -> DomainResult<InvocationOutcome> {
        let started = Instant::now();
        let url = self.endpoint(&invocation.executor);
        let fail = |reason: String| DomainError::InvocationFailed {
            executor: invocation.executor.clone(),
            reason,
        };

        let mut req = self
            .http
            .post(&url)
            .timeout(invocation.timeout)
            .json(&invocation);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| fail(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(fail(format!("gateway returned {status}: {body}")));
        }

        let mut outcome = resp
            .json::<InvocationOutcome>()
            .await
            .map_err(|e| fail(format!("invalid response body: {e}")))?;
        if outcome.execution_time_ms == 0 {
            outcome.execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        }
        debug!(executor = %invocation.executor, success = outcome.success, "http executor finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let exec = HttpExecutor::new(&HttpExecutorConfig {
            base_url: "http://gateway:9000/".to_string(),
            ..HttpExecutorConfig::default()
        })
        .unwrap();
        assert_eq!(
            exec.endpoint("omnisearch"),
            "http://gateway:9000/executors/omnisearch/invoke"
        );
    }
}
