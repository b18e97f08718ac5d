//! Bounded-time polling of backend-reported state
//!
//! One audited polling loop shared by every lifecycle operation. The
//! decision about a freshly observed state is a pure function
//! (`state -> ready | pending | failed`); sleeping, deadline accounting,
//! and transient-error retry all live here.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Fixed sleep between poll iterations.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Verdict on a freshly observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollDecision {
    /// The desired state was reached; stop and hand the state back.
    Ready,
    /// Keep waiting. The label is reported if the deadline lapses.
    Pending(String),
    /// Terminal failure; no amount of further waiting can succeed.
    Failed(String),
}

/// Repeatedly fetch a resource's state until `decide` reports it ready, a
/// terminal failure is observed, or the deadline elapses.
///
/// `timeout_seconds == 0` disables the deadline. Transport and backend
/// errors raised by `fetch` are retried until the deadline: failing to
/// observe the state is not the same as observing a failure state. A
/// `NotFound` or `Validation` error from `fetch` is definitive and
/// propagates immediately.
pub(crate) async fn poll_until<S, F, Fut>(
    mut fetch: F,
    decide: impl Fn(&S) -> PollDecision,
    timeout_seconds: f64,
    interval: Duration,
) -> Result<S>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let started = Instant::now();
    let budget = (timeout_seconds > 0.0).then(|| Duration::from_secs_f64(timeout_seconds));
    let mut last_state: Option<String> = None;

    loop {
        if let Some(budget) = budget {
            if started.elapsed() >= budget {
                let seen = last_state.as_deref().unwrap_or("never observed");
                return Err(Error::timeout(format!(
                    "timed out after {:.1}s (last observed state: {seen})",
                    started.elapsed().as_secs_f64(),
                )));
            }
        }

        match fetch().await {
            Ok(state) => match decide(&state) {
                PollDecision::Ready => return Ok(state),
                PollDecision::Failed(reason) => return Err(Error::backend(reason)),
                PollDecision::Pending(label) => {
                    debug!("still waiting (state: {label})");
                    last_state = Some(label);
                }
            },
            Err(err) if matches!(err, Error::NotFound(_) | Error::Validation(_)) => {
                return Err(err)
            }
            Err(err) => {
                warn!("state fetch failed, retrying until deadline: {err}");
            }
        }

        sleep(interval).await;
    }
}
