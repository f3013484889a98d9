//! HTTP executor - hands approved payloads to a ledger gateway

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ExecutionError, ExecutionReceipt, Executor};
use crate::approval::Payload;

/// Executor that POSTs payloads to `{base_url}/transactions`
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create an executor whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, payload: &Payload) -> Result<ExecutionReceipt, ExecutionError> {
        let response = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .json(&SubmitTransactionRequest { payload })
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected { status, body });
        }

        let submitted: SubmitTransactionResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

        tracing::debug!(signature = %submitted.signature, "Ledger accepted transaction");

        Ok(ExecutionReceipt::new(submitted.signature))
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct SubmitTransactionRequest<'a> {
    payload: &'a Payload,
}

#[derive(Debug, Deserialize)]
struct SubmitTransactionResponse {
    signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_executor_new() {
        let executor = HttpExecutor::new("http://localhost:8899");
        assert_eq!(executor.base_url(), "http://localhost:8899");
    }

    #[test]
    fn test_http_executor_trims_trailing_slash() {
        let executor = HttpExecutor::new(String::from("http://ledger:8080/"));
        assert_eq!(executor.base_url(), "http://ledger:8080");
    }

    #[test]
    fn test_http_executor_with_timeout() {
        let executor =
            HttpExecutor::with_timeout("http://ledger", Duration::from_secs(5)).unwrap();
        assert_eq!(executor.base_url(), "http://ledger");
    }

    #[test]
    fn test_submit_request_shape() {
        let payload = Payload {
            destination: "dest".into(),
            amount: 1.0,
            memo: None,
            body: serde_json::json!({"instructions": []}),
        };
        let json = serde_json::to_value(SubmitTransactionRequest { payload: &payload }).unwrap();
        assert_eq!(json["payload"]["destination"], "dest");
        assert!(json["payload"]["body"]["instructions"].is_array());
    }
}
