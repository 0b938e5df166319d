//! Mock dialer for testing and credential-less local runs
//!
//! Records every call it is asked to place instead of reaching a provider;
//! can be configured to fail to exercise the dispatch-failure path.

use super::{OutboundCall, OutboundDialer};
use crate::error::{GateError, Result};
use tokio::sync::Mutex;
use tracing::debug;

pub struct MockDialer {
    calls: Mutex<Vec<OutboundCall>>,
    failure: Option<String>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A dialer whose every dispatch fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    /// Calls placed so far.
    pub async fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OutboundDialer for MockDialer {
    async fn place_call(&self, call: &OutboundCall) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(GateError::DispatchFailed(message.clone()));
        }

        let mut calls = self.calls.lock().await;
        calls.push(call.clone());

        debug!("MockDialer: recorded call to {}", call.to);
        Ok(format!("CA-mock-{}", calls.len()))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
