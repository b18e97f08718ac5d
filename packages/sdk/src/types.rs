//! Core type definitions for sandbox orchestration

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default auto-stop interval in minutes
pub const DEFAULT_AUTO_STOP_INTERVAL: u32 = 15;

/// Runtime a new sandbox is provisioned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    TypeScript,
    JavaScript,
}

/// Backend-reported sandbox lifecycle state.
///
/// The backend is the source of truth; handles only carry the state seen
/// at the last poll or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    Creating,
    PendingBuild,
    Restoring,
    Starting,
    Started,
    Stopping,
    Stopped,
    Destroying,
    Destroyed,
    Archiving,
    Archived,
    /// Terminal failure reported by the backend.
    Error,
    /// Image build failed; waiting longer cannot succeed.
    BuildFailed,
    /// States introduced by the backend after this crate was published.
    #[default]
    #[serde(other)]
    Unknown,
}

impl SandboxState {
    /// Whether this state is a terminal failure that no amount of further
    /// waiting can resolve.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, SandboxState::Error | SandboxState::BuildFailed)
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SandboxState::Creating => "creating",
            SandboxState::PendingBuild => "pending_build",
            SandboxState::Restoring => "restoring",
            SandboxState::Starting => "starting",
            SandboxState::Started => "started",
            SandboxState::Stopping => "stopping",
            SandboxState::Stopped => "stopped",
            SandboxState::Destroying => "destroying",
            SandboxState::Destroyed => "destroyed",
            SandboxState::Archiving => "archiving",
            SandboxState::Archived => "archived",
            SandboxState::Error => "error",
            SandboxState::BuildFailed => "build_failed",
            SandboxState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Advisory sizing hints forwarded verbatim to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU cores
    pub cpu: Option<i32>,
    /// Memory in GiB
    pub memory: Option<i32>,
    /// Disk in GiB
    pub disk: Option<i32>,
    /// GPU count
    pub gpu: Option<i32>,
}

/// Parameters for creating a new sandbox.
///
/// All fields are optional; `Default` yields a Python sandbox with the
/// backend's stock image and a 15 minute auto-stop interval.
#[derive(Debug, Clone, Default)]
pub struct CreateParams {
    pub language: Language,
    /// Container image; the backend picks a language default when unset.
    pub image: Option<String>,
    pub os_user: Option<String>,
    pub env_vars: HashMap<String, String>,
    /// Labels used for find/list filtering.
    pub labels: HashMap<String, String>,
    pub public: bool,
    pub resources: Resources,
    /// Minutes of inactivity before the backend auto-stops the sandbox.
    /// `None` falls back to 15; `0` disables auto-stop.
    pub auto_stop_interval: Option<u32>,
}

/// Raw sandbox metadata as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxInfo {
    pub id: String,
    #[serde(default)]
    pub state: SandboxState,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub target: Option<String>,
    /// Populated by the backend when `state` is a failure state.
    pub error_reason: Option<String>,
    pub cpu: Option<i32>,
    pub memory: Option<i32>,
    pub disk: Option<i32>,
    pub gpu: Option<i32>,
    pub auto_stop_interval: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Backend fields this crate does not model.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_backend_spellings() {
        let state: SandboxState = serde_json::from_str("\"build_failed\"").unwrap();
        assert_eq!(state, SandboxState::BuildFailed);
        assert!(state.is_terminal_failure());

        let state: SandboxState = serde_json::from_str("\"started\"").unwrap();
        assert_eq!(state, SandboxState::Started);
        assert!(!state.is_terminal_failure());
    }

    #[test]
    fn unrecognized_states_deserialize_as_unknown() {
        let state: SandboxState = serde_json::from_str("\"pulling_snapshot\"").unwrap();
        assert_eq!(state, SandboxState::Unknown);
    }

    #[test]
    fn info_retains_unmodeled_fields() {
        let info: SandboxInfo = serde_json::from_value(serde_json::json!({
            "id": "sb-1",
            "state": "started",
            "labels": {"env": "dev"},
            "target": "us",
            "snapshotState": "none",
        }))
        .unwrap();

        assert_eq!(info.state, SandboxState::Started);
        assert_eq!(info.labels.get("env").map(String::as_str), Some("dev"));
        assert_eq!(
            info.extra.get("snapshotState"),
            Some(&serde_json::json!("none"))
        );
    }

    #[test]
    fn create_params_default_to_python() {
        let params = CreateParams::default();
        assert_eq!(params.language, Language::Python);
        assert_eq!(params.auto_stop_interval, None);
        assert!(!params.public);
    }
}
