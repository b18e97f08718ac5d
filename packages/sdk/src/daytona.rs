//! Sandbox lifecycle orchestration and queries
//!
//! Turns "fire an API call, then poll until a terminal state or timeout"
//! into single deterministic client-side operations.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::{CreateSandboxRequest, SandboxApi};
use crate::client::HttpSandboxApi;
use crate::config::Config;
use crate::error::{with_context, Error, Result};
use crate::poll::{poll_until, PollDecision, POLL_INTERVAL};
use crate::sandbox::Sandbox;
use crate::types::{CreateParams, SandboxInfo, SandboxState};

/// Default operation deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Entry point for managing remote sandboxes.
///
/// Every operation performs one or more backend calls interleaved with
/// sleep-based polling and returns (or fails) before control returns to
/// the caller; no background task outlives a call. A `Daytona` value is
/// cheap to clone and safe to share across tasks; independent operations
/// share no mutable state. Overlapping operations against the *same*
/// sandbox are arbitrated by the backend's state machine and may fail
/// with a backend or timeout error rather than silently succeeding.
#[derive(Clone)]
pub struct Daytona {
    api: Arc<dyn SandboxApi>,
    config: Config,
}

impl Daytona {
    /// Create a client backed by the HTTP API.
    pub fn new(config: Config) -> Result<Self> {
        let api = Arc::new(HttpSandboxApi::new(&config)?);
        Ok(Self::with_api(config, api))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_api(config: Config, api: Arc<dyn SandboxApi>) -> Self {
        Self { api, config }
    }

    /// Resolved configuration this client operates with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provision a new sandbox and wait until it reports `started`.
    ///
    /// `timeout_seconds` defaults to 60; `0` waits without a deadline. On
    /// timeout the remote sandbox may still be provisioning; treat the
    /// resource as unknown and check later rather than assuming rollback.
    pub async fn create(
        &self,
        params: CreateParams,
        timeout_seconds: Option<f64>,
    ) -> Result<Sandbox> {
        let timeout = validated_timeout(timeout_seconds)?;
        let request = CreateSandboxRequest::from_params(&params, &self.config.target);
        let started_at = Instant::now();

        debug!(
            "Creating sandbox (language: {:?}, target: {})",
            request.language, request.target
        );
        let info = with_context("Failed to create sandbox: ", async {
            let created = self.api.create_sandbox(&request).await?;
            if created.state == SandboxState::Started {
                return Ok(created);
            }
            if created.state.is_terminal_failure() {
                return Err(Error::backend(failure_reason(&created)));
            }
            let budget = remaining_budget(timeout, started_at)?;
            self.await_state(&created.id, SandboxState::Started, budget)
                .await
        })
        .await?;

        info!("Sandbox {} started", info.id);
        Ok(Sandbox::new(info))
    }

    /// Start a stopped sandbox and wait until it reports `started`.
    ///
    /// The handle's snapshot is updated in place on success.
    pub async fn start(&self, sandbox: &mut Sandbox, timeout_seconds: Option<f64>) -> Result<()> {
        let timeout = validated_timeout(timeout_seconds)?;
        let started_at = Instant::now();

        debug!("Starting sandbox {}", sandbox.id());
        let info = with_context("Failed to start sandbox: ", async {
            self.api.start_sandbox(sandbox.id()).await?;
            let budget = remaining_budget(timeout, started_at)?;
            self.await_state(sandbox.id(), SandboxState::Started, budget)
                .await
        })
        .await?;

        info!("Sandbox {} started", info.id);
        sandbox.update(info);
        Ok(())
    }

    /// Stop a running sandbox and wait until it reports `stopped`.
    ///
    /// The handle's snapshot is updated in place on success.
    pub async fn stop(&self, sandbox: &mut Sandbox, timeout_seconds: Option<f64>) -> Result<()> {
        let timeout = validated_timeout(timeout_seconds)?;
        let started_at = Instant::now();

        debug!("Stopping sandbox {}", sandbox.id());
        let info = with_context("Failed to stop sandbox: ", async {
            self.api.stop_sandbox(sandbox.id()).await?;
            let budget = remaining_budget(timeout, started_at)?;
            self.await_state(sandbox.id(), SandboxState::Stopped, budget)
                .await
        })
        .await?;

        info!("Sandbox {} stopped", info.id);
        sandbox.update(info);
        Ok(())
    }

    /// Delete a sandbox and wait until the backend reports it absent.
    ///
    /// Deleting a sandbox that is already gone succeeds.
    pub async fn delete(&self, sandbox: &Sandbox, timeout_seconds: Option<f64>) -> Result<()> {
        let timeout = validated_timeout(timeout_seconds)?;
        let started_at = Instant::now();
        let id = sandbox.id();

        debug!("Deleting sandbox {id}");
        with_context("Failed to delete sandbox: ", async {
            match self.api.delete_sandbox(id).await {
                Err(err) if err.is_not_found() => {
                    debug!("Sandbox {id} already deleted");
                    return Ok(());
                }
                other => other?,
            };

            let budget = remaining_budget(timeout, started_at)?;
            let api = self.api.as_ref();
            poll_until(
                move || async move {
                    match api.get_sandbox(id).await {
                        Ok(info) => Ok(Some(info.state)),
                        Err(err) if err.is_not_found() => Ok(None),
                        Err(err) => Err(err),
                    }
                },
                |observed: &Option<SandboxState>| match observed {
                    None => PollDecision::Ready,
                    Some(state) => PollDecision::Pending(state.to_string()),
                },
                budget,
                POLL_INTERVAL,
            )
            .await?;
            Ok(())
        })
        .await?;

        info!("Sandbox {id} deleted");
        Ok(())
    }

    /// Fetch a sandbox by id.
    pub async fn get(&self, id: &str) -> Result<Sandbox> {
        let info = with_context("Failed to get sandbox: ", self.api.get_sandbox(id)).await?;
        Ok(Sandbox::new(info))
    }

    /// Re-fetch the snapshot held by a handle.
    pub async fn refresh(&self, sandbox: &mut Sandbox) -> Result<()> {
        let info =
            with_context("Failed to get sandbox: ", self.api.get_sandbox(sandbox.id())).await?;
        sandbox.update(info);
        Ok(())
    }

    /// Find a single sandbox by id or by label filter.
    ///
    /// With an id the lookup is direct. With labels, the first sandbox in
    /// backend list order whose labels contain every filter entry is
    /// returned. One of the two must be usable; the id wins when both are
    /// supplied.
    pub async fn find_one(
        &self,
        id: Option<&str>,
        labels: Option<&HashMap<String, String>>,
    ) -> Result<Sandbox> {
        with_context("Failed to find sandbox: ", async {
            if let Some(id) = id {
                let info = self.api.get_sandbox(id).await?;
                return Ok(Sandbox::new(info));
            }

            let filter = labels.filter(|filter| !filter.is_empty()).ok_or_else(|| {
                Error::validation("either a sandbox id or a non-empty label filter is required")
            })?;

            let all = self.api.list_sandboxes().await?;
            let found = all
                .into_iter()
                .find(|info| labels_match(&info.labels, filter))
                .ok_or_else(|| {
                    Error::not_found(format!(
                        "no sandbox matched labels {}",
                        format_labels(filter)
                    ))
                })?;
            Ok(Sandbox::new(found))
        })
        .await
    }

    /// List sandboxes, optionally filtered by labels.
    ///
    /// An empty or absent filter returns the full backend list; order is
    /// preserved as returned by the backend.
    pub async fn list(&self, labels: Option<&HashMap<String, String>>) -> Result<Vec<Sandbox>> {
        with_context("Failed to list sandboxes: ", async {
            let all = self.api.list_sandboxes().await?;
            Ok(all
                .into_iter()
                .filter(|info| {
                    labels.map_or(true, |filter| labels_match(&info.labels, filter))
                })
                .map(Sandbox::new)
                .collect())
        })
        .await
    }

    /// Poll a sandbox until it reaches `desired`, fails terminally, or the
    /// budget lapses.
    async fn await_state(
        &self,
        id: &str,
        desired: SandboxState,
        timeout_seconds: f64,
    ) -> Result<SandboxInfo> {
        let api = self.api.as_ref();
        poll_until(
            move || api.get_sandbox(id),
            |info: &SandboxInfo| {
                if info.state == desired {
                    PollDecision::Ready
                } else if info.state.is_terminal_failure() {
                    PollDecision::Failed(failure_reason(info))
                } else {
                    PollDecision::Pending(info.state.to_string())
                }
            },
            timeout_seconds,
            POLL_INTERVAL,
        )
        .await
    }
}

fn validated_timeout(timeout_seconds: Option<f64>) -> Result<f64> {
    let timeout = timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if !timeout.is_finite() || timeout < 0.0 {
        return Err(Error::validation(format!(
            "timeout must be a non-negative number of seconds, got {timeout}"
        )));
    }
    Ok(timeout)
}

/// Deadline left for polling once the initiating call has returned.
fn remaining_budget(timeout: f64, started_at: Instant) -> Result<f64> {
    if timeout == 0.0 {
        return Ok(0.0);
    }
    let elapsed = started_at.elapsed().as_secs_f64();
    if elapsed >= timeout {
        return Err(Error::timeout(format!(
            "timed out after {elapsed:.1}s waiting for the sandbox to become ready"
        )));
    }
    Ok(timeout - elapsed)
}

fn failure_reason(info: &SandboxInfo) -> String {
    match &info.error_reason {
        Some(reason) => format!("sandbox {} entered {} state: {reason}", info.id, info.state),
        None => format!("sandbox {} entered {} state", info.id, info.state),
    }
}

/// True when every filter entry appears in `labels` with an equal value.
fn labels_match(labels: &HashMap<String, String>, filter: &HashMap<String, String>) -> bool {
    filter
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}

fn format_labels(filter: &HashMap<String, String>) -> String {
    let mut entries: Vec<String> = filter
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    entries.sort();
    entries.join(",")
}
