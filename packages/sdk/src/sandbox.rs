//! Caller-owned sandbox handle

use std::collections::HashMap;

use crate::types::{SandboxInfo, SandboxState};

/// Handle to a remote sandbox.
///
/// Carries the backend metadata observed at the last poll or query;
/// [`state`](Sandbox::state) is a snapshot, not a live view. The handle
/// stays valid as a lookup key even if the backend deletes the sandbox
/// out-of-band; later operations against it fail with `NotFound` rather
/// than corrupting local state.
#[derive(Debug, Clone)]
pub struct Sandbox {
    info: SandboxInfo,
}

impl Sandbox {
    pub(crate) fn new(info: SandboxInfo) -> Self {
        Self { info }
    }

    /// Backend identifier.
    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// State at the last poll or query.
    pub fn state(&self) -> SandboxState {
        self.info.state
    }

    /// Labels assigned at creation.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.info.labels
    }

    /// Target region the sandbox runs in.
    pub fn target(&self) -> Option<&str> {
        self.info.target.as_deref()
    }

    /// Full backend metadata snapshot.
    pub fn info(&self) -> &SandboxInfo {
        &self.info
    }

    pub(crate) fn update(&mut self, info: SandboxInfo) {
        self.info = info;
    }
}
