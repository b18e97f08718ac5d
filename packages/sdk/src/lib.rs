//! Client SDK for remote Daytona sandboxes
//!
//! Presents a synchronous-looking, typed surface over backend operations
//! that are intrinsically asynchronous: provisioning or tearing down a
//! sandbox takes seconds to minutes and is observed only through polling.
//! Every lifecycle operation returns once the backend
//! reaches the requested state, reports a terminal failure, or the
//! deadline elapses, and never returns a partial state as success.
//!
//! ```no_run
//! use daytona_sdk::{Config, ConfigOverrides, CreateParams, Daytona};
//!
//! # async fn run() -> daytona_sdk::Result<()> {
//! let config = Config::resolve(ConfigOverrides::default())?;
//! let client = Daytona::new(config)?;
//!
//! let sandbox = client.create(CreateParams::default(), None).await?;
//! println!("sandbox {} is {}", sandbox.id(), sandbox.state());
//!
//! client.delete(&sandbox, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod daytona;
pub mod error;
mod poll;
pub mod sandbox;
pub mod types;

// Re-export commonly used types
pub use api::{CreateSandboxRequest, SandboxApi};
pub use client::HttpSandboxApi;
pub use config::{Config, ConfigOverrides, Credentials};
pub use daytona::{Daytona, DEFAULT_TIMEOUT_SECS};
pub use error::{Error, Result};
pub use sandbox::Sandbox;
pub use types::{CreateParams, Language, Resources, SandboxInfo, SandboxState};
