//! Resilient fetch primitives: fixed-backoff retry and offset pagination.
//!
//! Both are transport-agnostic. They take closures that perform one remote
//! call and never let an error escape to the caller.

mod paginate;
mod retry;

pub use paginate::{Page, PageSink, Paginator};
pub use retry::{RetryExecutor, RetryOutcome, RetryPolicy, RetryState};
