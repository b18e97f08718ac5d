//! Backend API boundary: wire models and the transport capability

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CreateParams, Language, SandboxInfo, DEFAULT_AUTO_STOP_INTERVAL};

/// Request body for sandbox creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSandboxRequest {
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_user: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env_vars: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<i32>,
    pub auto_stop_interval: u32,
    pub target: String,
}

impl CreateSandboxRequest {
    /// Build the wire request from caller params and the resolved target,
    /// applying defaults (Python, 15 minute auto-stop).
    pub(crate) fn from_params(params: &CreateParams, target: &str) -> Self {
        Self {
            language: params.language,
            image: params.image.clone(),
            os_user: params.os_user.clone(),
            env_vars: params.env_vars.clone(),
            labels: params.labels.clone(),
            public: params.public,
            cpu: params.resources.cpu,
            memory: params.resources.memory,
            disk: params.resources.disk,
            gpu: params.resources.gpu,
            auto_stop_interval: params
                .auto_stop_interval
                .unwrap_or(DEFAULT_AUTO_STOP_INTERVAL),
            target: target.to_string(),
        }
    }
}

/// Error payload returned by the backend API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub status_code: Option<u16>,
}

/// Transport capability consumed by the orchestrator.
///
/// [`HttpSandboxApi`](crate::client::HttpSandboxApi) is the production
/// implementation; tests substitute mocks or scripted fakes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// Ask the backend to provision a new sandbox. May return before the
    /// sandbox is runnable.
    async fn create_sandbox(&self, request: &CreateSandboxRequest) -> Result<SandboxInfo>;

    /// Fetch the current state of a sandbox.
    async fn get_sandbox(&self, id: &str) -> Result<SandboxInfo>;

    /// List every sandbox visible to the caller's credentials.
    async fn list_sandboxes(&self) -> Result<Vec<SandboxInfo>>;

    /// Ask the backend to start a stopped sandbox.
    async fn start_sandbox(&self, id: &str) -> Result<()>;

    /// Ask the backend to stop a running sandbox.
    async fn stop_sandbox(&self, id: &str) -> Result<()>;

    /// Ask the backend to delete a sandbox.
    async fn delete_sandbox(&self, id: &str) -> Result<()>;
}
