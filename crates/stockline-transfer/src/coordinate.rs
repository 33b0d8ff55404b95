//! # Batch Coordination
//!
//! Retry policy and cancellation checks shared by every transfer operation.
//!
//! ## Retry Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Whole-Batch Retry                                    │
//! │                                                                         │
//! │  run_with_retry(policy, batch)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  attempt 1 ──► TransferError::Db(Busy)?  ── transient ──┐              │
//! │       ▲                                                  │              │
//! │       │        sleep(backoff: 100ms, 200ms, 400ms...)   │              │
//! │       └──────────────────────────────────────────────────┘              │
//! │                                                                         │
//! │  Non-transient error           → returned immediately                  │
//! │  Ok                            → returned immediately                  │
//! │  Transient past attempt budget → RetriesExhausted                      │
//! │                                                                         │
//! │  The unit of retry is the WHOLE batch transaction. A failed attempt    │
//! │  rolled back, so replaying it is safe and observes fresh store state.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{TransferError, TransferResult};

// =============================================================================
// Retry Policy
// =============================================================================

/// Bounds on batch replays after transient store failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (not "retries after").
    pub max_attempts: u32,

    /// Initial backoff duration.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Creates the exponential backoff state for one run.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // Attempt count bounds us, not wall time
            ..Default::default()
        }
    }
}

// =============================================================================
// Retry Loop
// =============================================================================

/// Runs a batch, replaying it on transient store failures.
///
/// `body` must build a fresh future per call - each attempt is a complete
/// re-execution of the batch against current store state.
///
/// ## Example
/// ```rust,ignore
/// let applied = run_with_retry(&policy, || {
///     reconcile_rows(&db, &identity, &rows, &cancel)
/// })
/// .await?;
/// ```
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut body: F) -> TransferResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TransferResult<T>>,
{
    let mut backoff = policy.create_backoff();
    let mut attempt: u32 = 1;

    loop {
        match body().await {
            Ok(value) => return Ok(value),

            Err(e) if e.is_transient() => {
                if attempt >= policy.max_attempts {
                    return Err(TransferError::RetriesExhausted {
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }

                let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
                warn!(attempt, ?delay, error = %e, "Transient store failure, replaying batch");

                tokio::time::sleep(delay).await;
                attempt += 1;
            }

            Err(e) => return Err(e),
        }
    }
}

/// Fails fast if the caller has cancelled.
///
/// Called before every store round trip so a cancelled job stops at the
/// next suspension point instead of grinding through the rest of a batch.
pub fn ensure_live(cancel: &CancellationToken) -> TransferResult<()> {
    if cancel.is_cancelled() {
        Err(TransferError::Cancelled)
    } else {
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
