use crate::protocol::{QuasiHttpError, ReasonCode, Response};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;

/// A send or accept procedure handed to a [`TimeoutScheduler`].
pub type Procedure<'a> = BoxFuture<'a, Result<Option<Response>, QuasiHttpError>>;

/// Outcome of running a procedure under a [`TimeoutScheduler`].
#[derive(Debug)]
pub enum TimeoutResult {
    /// The procedure finished in time. Accepting never yields a response.
    Completed(Option<Response>),
    /// The deadline passed first; the procedure was dropped.
    TimedOut,
    /// The procedure failed in time.
    Failed(QuasiHttpError),
}

/// Bounds the duration of a whole send or accept exchange.
#[async_trait]
pub trait TimeoutScheduler: Send + Sync {
    /// `None` means the scheduler reached no verdict, which counts as a
    /// completion without response.
    async fn run_under_timeout<'a>(&'a self, procedure: Procedure<'a>) -> Option<TimeoutResult>;
}

/// Races the procedure against [`tokio::time::timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokioTimeoutScheduler {
    timeout: Duration,
}

impl TokioTimeoutScheduler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns `None` unless `timeout_millis` is positive.
    pub fn from_millis(timeout_millis: i64) -> Option<Self> {
        u64::try_from(timeout_millis)
            .ok()
            .filter(|millis| *millis > 0)
            .map(|millis| Self::new(Duration::from_millis(millis)))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl TimeoutScheduler for TokioTimeoutScheduler {
    async fn run_under_timeout<'a>(&'a self, procedure: Procedure<'a>) -> Option<TimeoutResult> {
        match tokio::time::timeout(self.timeout, procedure).await {
            Ok(Ok(response)) => Some(TimeoutResult::Completed(response)),
            Ok(Err(e)) => Some(TimeoutResult::Failed(e)),
            Err(elapsed) => {
                debug!(timeout = ?self.timeout, %elapsed, "procedure timed out");
                Some(TimeoutResult::TimedOut)
            }
        }
    }
}

/// Runs `procedure` under `scheduler` and turns its verdict into a result.
///
/// Failures are returned unchanged. A timeout becomes a
/// [`ReasonCode::TIMEOUT`] error. On the client side a missing response is an
/// error as well.
pub async fn run_timeout_scheduler<'a, S>(
    scheduler: &'a S,
    for_client: bool,
    procedure: Procedure<'a>,
) -> Result<Option<Response>, QuasiHttpError>
where
    S: TimeoutScheduler + ?Sized,
{
    let response = match scheduler.run_under_timeout(procedure).await {
        Some(TimeoutResult::Failed(e)) => return Err(e),
        Some(TimeoutResult::TimedOut) => {
            let message = if for_client { "send timeout" } else { "receive timeout" };
            return Err(QuasiHttpError::protocol(message, ReasonCode::TIMEOUT));
        }
        Some(TimeoutResult::Completed(response)) => response,
        None => None,
    };
    if for_client && response.is_none() {
        return Err(QuasiHttpError::general("no response from timeout scheduler"));
    }
    Ok(response)
}
