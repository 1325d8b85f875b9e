//! Management operations and the controller that executes them.

use std::time::Instant;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::RunningMode;

/// A management operation as posted to `/management`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagementOperation {
    pub operation: String,

    #[serde(default)]
    pub address: Vec<String>,

    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl ManagementOperation {
    pub fn read_resource() -> Self {
        Self {
            operation: "read-resource".to_string(),
            address: Vec::new(),
            parameters: Map::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OperationResult {
    pub outcome: Outcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_description: Option<String>,
}

impl OperationResult {
    pub fn success(result: Value) -> Self {
        Self {
            outcome: Outcome::Success,
            result: Some(result),
            failure_description: None,
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            result: None,
            failure_description: Some(description.into()),
        }
    }
}

/// Executes management operations against the process model.
pub trait ModelController: Send + Sync + 'static {
    fn execute(&self, operation: ManagementOperation) -> BoxFuture<'static, OperationResult>;
}

/// Controller for a standalone process: answers from its own identity.
#[derive(Debug, Clone)]
pub struct StandaloneController {
    node_name: String,
    running_mode: RunningMode,
    started: Instant,
}

impl StandaloneController {
    pub fn new(node_name: impl Into<String>, running_mode: RunningMode) -> Self {
        Self {
            node_name: node_name.into(),
            running_mode,
            started: Instant::now(),
        }
    }

    fn root(&self) -> Value {
        json!({
            "name": self.node_name,
            "product-version": env!("CARGO_PKG_VERSION"),
            "running-mode": self.running_mode,
            "server-state": "running",
            "uptime-secs": self.started.elapsed().as_secs(),
        })
    }

    fn dispatch(&self, operation: &ManagementOperation) -> OperationResult {
        if !operation.address.is_empty() {
            return OperationResult::failed(format!(
                "resource not found: {}",
                operation.address.join("/")
            ));
        }

        match operation.operation.as_str() {
            "read-resource" => OperationResult::success(self.root()),
            "read-attribute" => {
                let Some(name) = operation.parameter("name") else {
                    return OperationResult::failed("read-attribute requires a 'name' parameter");
                };
                match self.root().get(name) {
                    Some(value) => OperationResult::success(value.clone()),
                    None => OperationResult::failed(format!("unknown attribute '{name}'")),
                }
            }
            "whoami" => OperationResult::success(json!({ "identity": "anonymous" })),
            other => OperationResult::failed(format!("unknown operation '{other}'")),
        }
    }
}

impl ModelController for StandaloneController {
    fn execute(&self, operation: ManagementOperation) -> BoxFuture<'static, OperationResult> {
        let result = self.dispatch(&operation);
        Box::pin(async move { result })
    }
}
