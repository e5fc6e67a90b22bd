//! Fixed-backoff retry around a single remote call.

use color_eyre::Report;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
///
/// The pause is constant: no exponential growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub backoff: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, backoff: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      backoff,
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(5, Duration::from_secs(5))
  }
}

/// Executor state. `Succeeded` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
  Idle,
  Attempting { attempt: u32 },
  Succeeded { attempts: u32 },
  Exhausted { attempts: u32 },
}

/// Terminal outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T> {
  Succeeded { value: T, attempts: u32 },
  Exhausted { attempts: u32, last_error: Report },
}

impl<T> RetryOutcome<T> {
  pub fn attempts(&self) -> u32 {
    match self {
      Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
    }
  }

  pub fn state(&self) -> RetryState {
    match self {
      Self::Succeeded { attempts, .. } => RetryState::Succeeded {
        attempts: *attempts,
      },
      Self::Exhausted { attempts, .. } => RetryState::Exhausted {
        attempts: *attempts,
      },
    }
  }

  /// Collapse into the "value or no result" form callers work with.
  pub fn into_value(self) -> Option<T> {
    match self {
      Self::Succeeded { value, .. } => Some(value),
      Self::Exhausted { .. } => None,
    }
  }
}

/// Runs operations under a [`RetryPolicy`].
///
/// Errors never escape: after the last failed attempt the executor logs the
/// reason and hands back `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
  policy: RetryPolicy,
}

impl RetryExecutor {
  pub fn new(policy: RetryPolicy) -> Self {
    Self { policy }
  }

  pub fn policy(&self) -> RetryPolicy {
    self.policy
  }

  /// Run `op` until it succeeds or the attempt budget is spent.
  pub async fn run<T, F, Fut>(&self, op: F) -> Option<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = color_eyre::Result<T>>,
  {
    self.run_with_outcome(op).await.into_value()
  }

  pub async fn run_with_outcome<T, F, Fut>(&self, mut op: F) -> RetryOutcome<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = color_eyre::Result<T>>,
  {
    let mut state = RetryState::Idle;
    debug!(?state, max_attempts = self.policy.max_attempts, "starting remote call");

    let mut attempt = 0;
    loop {
      attempt += 1;
      state = RetryState::Attempting { attempt };

      match op().await {
        Ok(value) => {
          if attempt > 1 {
            debug!(?state, "remote call succeeded after retry");
          }
          return RetryOutcome::Succeeded {
            value,
            attempts: attempt,
          };
        }
        Err(err) if attempt >= self.policy.max_attempts => {
          warn!(attempts = attempt, error = %err, "giving up on remote call");
          return RetryOutcome::Exhausted {
            attempts: attempt,
            last_error: err,
          };
        }
        Err(err) => {
          debug!(
            ?state,
            backoff_ms = self.policy.backoff.as_millis() as u64,
            error = %err,
            "remote call failed, sleeping before retry"
          );
          tokio::time::sleep(self.policy.backoff).await;
        }
      }
    }
  }
}
