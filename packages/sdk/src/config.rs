//! Client configuration resolution
//!
//! Merges explicit overrides with environment fallback and hard defaults,
//! and validates that a usable credential combination exists.

use std::env;

use tracing::warn;

use crate::error::{Error, Result};

// Environment variable names
pub const ENV_API_KEY: &str = "DAYTONA_API_KEY";
pub const ENV_JWT_TOKEN: &str = "DAYTONA_JWT_TOKEN";
pub const ENV_ORGANIZATION_ID: &str = "DAYTONA_ORGANIZATION_ID";
pub const ENV_API_URL: &str = "DAYTONA_API_URL";
pub const ENV_SERVER_URL: &str = "DAYTONA_SERVER_URL"; // Legacy
pub const ENV_TARGET: &str = "DAYTONA_TARGET";

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://app.daytona.io/api";

/// Default target region
pub const DEFAULT_TARGET: &str = "us";

/// How the client authenticates against the backend.
///
/// Exactly one credential form exists per resolved configuration; an API
/// key wins over a JWT when both are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Long-lived API key.
    ApiKey(String),
    /// Short-lived JWT together with the organization it acts for.
    Jwt {
        token: String,
        organization_id: String,
    },
}

/// Explicit configuration passed to [`Config::resolve`].
///
/// Unset fields fall back to the environment, then to hard defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub jwt_token: Option<String>,
    pub organization_id: Option<String>,
    pub api_url: Option<String>,
    /// Deprecated alias for `api_url`, consulted at lower precedence.
    pub server_url: Option<String>,
    pub target: Option<String>,
}

/// Resolved client configuration. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_url: String,
    pub target: String,
}

impl Config {
    /// Resolve configuration from explicit overrides, the process
    /// environment, and hard defaults, in that order per field.
    ///
    /// Fails with a validation error when neither an API key nor a JWT
    /// token with an organization id can be resolved.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |name| env::var(name).ok())
    }

    /// Resolution against an injected environment lookup.
    pub(crate) fn resolve_with(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Empty environment values count as unset.
        let env = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let api_url = overrides
            .api_url
            .or_else(|| {
                overrides.server_url.map(|url| {
                    warn!("`server_url` is deprecated, use `api_url` instead");
                    url
                })
            })
            .or_else(|| env(ENV_API_URL))
            .or_else(|| {
                env(ENV_SERVER_URL).map(|url| {
                    warn!("{ENV_SERVER_URL} is deprecated, use {ENV_API_URL} instead");
                    url
                })
            })
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let target = overrides
            .target
            .or_else(|| env(ENV_TARGET))
            .unwrap_or_else(|| DEFAULT_TARGET.to_string());

        let credentials = match overrides.api_key.or_else(|| env(ENV_API_KEY)) {
            Some(key) => Credentials::ApiKey(key),
            None => {
                let token = overrides
                    .jwt_token
                    .or_else(|| env(ENV_JWT_TOKEN))
                    .ok_or_else(|| {
                        Error::validation(format!(
                            "no credentials found: set {ENV_API_KEY}, or {ENV_JWT_TOKEN} \
                             together with {ENV_ORGANIZATION_ID}"
                        ))
                    })?;
                let organization_id = overrides
                    .organization_id
                    .or_else(|| env(ENV_ORGANIZATION_ID))
                    .ok_or_else(|| {
                        Error::validation(
                            "an organization ID is required when authenticating with a JWT token",
                        )
                    })?;
                Credentials::Jwt {
                    token,
                    organization_id,
                }
            }
        };

        Ok(Self {
            credentials,
            api_url,
            target,
        })
    }

    /// Bearer token sent in the `Authorization` header.
    pub(crate) fn bearer_token(&self) -> &str {
        match &self.credentials {
            Credentials::ApiKey(key) => key,
            Credentials::Jwt { token, .. } => token,
        }
    }

    /// Organization the client acts for, when JWT-authenticated.
    pub(crate) fn organization_id(&self) -> Option<&str> {
        match &self.credentials {
            Credentials::ApiKey(_) => None,
            Credentials::Jwt {
                organization_id, ..
            } => Some(organization_id),
        }
    }
}
