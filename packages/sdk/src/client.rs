//! HTTP implementation of the backend API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use tracing::debug;

use crate::api::{ApiErrorBody, CreateSandboxRequest, SandboxApi};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::SandboxInfo;

/// Per-request timeout; operation deadlines are enforced by the caller's
/// polling budget, not here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Organization header sent under JWT authentication.
const ORGANIZATION_HEADER: &str = "X-Daytona-Organization-ID";

/// [`SandboxApi`] backed by the Daytona REST API.
pub struct HttpSandboxApi {
    http_client: Client,
    api_url: String,
    bearer_token: String,
    organization_id: Option<String>,
}

impl HttpSandboxApi {
    /// Create a new API client from resolved configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token().to_string(),
            organization_id: config.organization_id().map(str::to_string),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        let mut builder = self
            .http_client
            .request(method, url)
            .bearer_auth(&self.bearer_token);
        if let Some(organization_id) = &self.organization_id {
            builder = builder.header(ORGANIZATION_HEADER, organization_id);
        }
        builder
    }

    /// Map a non-success response to the error taxonomy.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|payload| payload.message)
            .unwrap_or(body);
        if message.is_empty() {
            message = status.to_string();
        }

        match status {
            StatusCode::NOT_FOUND => Err(Error::not_found(message)),
            StatusCode::UNAUTHORIZED => {
                Err(Error::backend(format!("authentication failed: {message}")))
            }
            _ => Err(Error::backend(message)),
        }
    }
}

#[async_trait]
impl SandboxApi for HttpSandboxApi {
    async fn create_sandbox(&self, request: &CreateSandboxRequest) -> Result<SandboxInfo> {
        debug!("POST /sandbox (target: {})", request.target);
        let response = self
            .request(Method::POST, "/sandbox")
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_sandbox(&self, id: &str) -> Result<SandboxInfo> {
        let response = self
            .request(Method::GET, &format!("/sandbox/{id}"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_sandboxes(&self) -> Result<Vec<SandboxInfo>> {
        debug!("GET /sandbox");
        let response = self.request(Method::GET, "/sandbox").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn start_sandbox(&self, id: &str) -> Result<()> {
        debug!("POST /sandbox/{id}/start");
        let response = self
            .request(Method::POST, &format!("/sandbox/{id}/start"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn stop_sandbox(&self, id: &str) -> Result<()> {
        debug!("POST /sandbox/{id}/stop");
        let response = self
            .request(Method::POST, &format!("/sandbox/{id}/stop"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_sandbox(&self, id: &str) -> Result<()> {
        debug!("DELETE /sandbox/{id}");
        let response = self
            .request(Method::DELETE, &format!("/sandbox/{id}"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
