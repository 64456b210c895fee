//! Job-status polling.
//!
//! [`poll_job_status`] asks `/job-status/{id}` until the job finishes or
//! fails, sleeping between attempts. With the default [`PollPolicy`] it
//! waits a fixed second and never gives up; the caller stops it through
//! the [`CancellationToken`].

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{require_body, HttpTransport, JobState};

/// Pacing and bounds for the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first non-terminal answer.
    pub interval: Duration,
    /// Stop with [`PollOutcome::Exhausted`] after this many requests.
    /// `None` polls until a terminal status or cancellation.
    pub max_attempts: Option<u32>,
    /// Growth factor applied to the delay after each attempt.
    pub multiplier: f64,
    /// Upper bound on the delay between attempts.
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_attempts: None,
            multiplier: 1.0,
            max_interval: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    /// Delay to use after `current`, clamped to [`PollPolicy::max_interval`].
    /// Never shrinks below `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if self.multiplier <= 1.0 {
            return current;
        }
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms)
            .min(self.max_interval)
            .max(current)
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The job finished; carries its `result` (null when absent).
    Finished(Value),
    /// The server marked the job failed.
    Failed,
    /// A request or its decoding failed.
    TransportError(String),
    Cancelled,
    /// `max_attempts` requests came back non-terminal.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Number of status requests that completed.
    pub attempts: u32,
}

pub fn job_status_path(job_id: &str) -> String {
    format!("/job-status/{}", job_id)
}

/// Poll the status of `job_id` until it reaches a terminal state.
///
/// At most one request is in flight; the next one is only scheduled once
/// the previous answer has been read.
pub async fn poll_job_status(
    transport: &dyn HttpTransport,
    job_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> PollReport {
    let path = job_status_path(job_id);
    let mut delay = policy.interval;
    let mut attempts = 0u32;

    let outcome = loop {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => break PollOutcome::Cancelled,
            response = transport.get_json(&path) => response.and_then(require_body),
        };
        attempts += 1;

        match response {
            Err(e) => {
                tracing::error!(job_id, attempt = attempts, error = %e, "Error checking job status");
                break PollOutcome::TransportError(e.to_string());
            }
            Ok(body) => match JobState::from_response(&body) {
                JobState::Finished(result) => {
                    tracing::info!(job_id, attempts, "Job finished");
                    break PollOutcome::Finished(result);
                }
                JobState::Failed => {
                    tracing::warn!(job_id, attempts, "Job failed on the server");
                    break PollOutcome::Failed;
                }
                JobState::Pending(status) => {
                    tracing::debug!(job_id, attempt = attempts, %status, "Job still running");
                }
            },
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            tracing::warn!(job_id, attempts, "Giving up on job status");
            break PollOutcome::Exhausted;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break PollOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = policy.next_interval(delay);
    };

    if outcome == PollOutcome::Cancelled {
        tracing::info!(job_id, attempts, "Polling cancelled");
    }

    PollReport { outcome, attempts }
}
