//! Report completion polling.
//!
//! Waiting for a report is modeled as an explicit state machine so the
//! retry classification and deadline handling are testable apart from
//! the sleeping loop, and so the single-shot status check classifies
//! statuses identically to the loop.

use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::service::{ScanService, ServiceError, hash_form};

/// Statuses meaning "the remote side has not produced the report yet":
/// not found, too early, rate limited, service unavailable. Anything
/// else is definitive and surfaces immediately.
pub const RETRYABLE_STATUSES: [u16; 5] = [400, 404, 425, 429, 503];

/// Whether a failure warrants another poll attempt.
pub fn is_retryable(error: &ServiceError) -> bool {
    matches!(error.status(), Some(status) if RETRYABLE_STATUSES.contains(&status))
}

/// Outcome of one poll transition.
#[derive(Debug)]
pub enum PollState {
    /// Not ready yet; suspend for the interval and try again.
    Polling,
    /// The report arrived.
    Ready(Value),
    /// A non-retryable failure; propagated unchanged.
    Failed(ServiceError),
    /// The deadline elapsed while the report was still pending.
    TimedOut,
}

/// One in-flight wait for a report, scoped to a single call.
#[derive(Debug)]
pub struct PollSession {
    hash: String,
    interval: Duration,
    deadline: Instant,
    attempts: u32,
}

impl PollSession {
    pub fn new(hash: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            hash: hash.into(),
            interval,
            deadline: Instant::now() + timeout,
            attempts: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Applies one attempt's outcome, advancing the state machine.
    ///
    /// The deadline is evaluated here, before any sleep, so an endpoint
    /// that never becomes ready overruns the timeout by at most one
    /// interval.
    pub fn observe(&mut self, outcome: Result<Value, ServiceError>) -> PollState {
        self.attempts += 1;
        match outcome {
            Ok(payload) => PollState::Ready(payload),
            Err(error) if is_retryable(&error) => {
                if Instant::now() >= self.deadline {
                    PollState::TimedOut
                } else {
                    PollState::Polling
                }
            }
            Err(error) => PollState::Failed(error),
        }
    }
}

/// Fetches the report for `hash` once. Shared by the poll loop, the
/// single-shot status check, and the report/projection tools.
pub(crate) async fn fetch_report(
    service: &dyn ScanService,
    hash: &str,
) -> Result<Value, ServiceError> {
    service.post_form("api/v1/report_json", hash_form(hash)).await
}

/// Polls until the report for `hash` is ready, a non-retryable failure
/// occurs, or the deadline elapses. Suspension is cooperative; other
/// in-flight calls are never blocked by this loop.
pub async fn wait_for_report(
    service: &dyn ScanService,
    hash: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<Value, ToolError> {
    let mut session = PollSession::new(hash, interval, timeout);
    loop {
        let outcome = fetch_report(service, hash).await;
        match session.observe(outcome) {
            PollState::Ready(payload) => {
                debug!(hash, attempts = session.attempts(), "report ready");
                return Ok(payload);
            }
            PollState::Failed(error) => {
                debug!(hash, %error, "report fetch failed");
                return Err(error.into());
            }
            PollState::TimedOut => {
                warn!(hash, attempts = session.attempts(), "report wait timed out");
                return Err(ToolError::Timeout {
                    hash: hash.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            PollState::Polling => {
                debug!(hash, attempts = session.attempts(), "report pending");
                tokio::time::sleep(session.interval()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockScanService;
    use mockall::Sequence;
    use serde_json::json;

    fn not_ready(status: u16) -> ServiceError {
        ServiceError::Status {
            status,
            body: None,
            message: "not ready".to_string(),
        }
    }

    #[test]
    fn retryable_statuses_mean_not_ready_yet() {
        for status in [400, 404, 425, 429, 503] {
            assert!(is_retryable(&not_ready(status)), "status {}", status);
        }
        for status in [401, 403, 500, 502] {
            assert!(!is_retryable(&not_ready(status)), "status {}", status);
        }
        assert!(!is_retryable(&ServiceError::Transport("refused".into())));
    }

    #[test]
    fn attempts_only_increase() {
        let mut session =
            PollSession::new("abc", Duration::from_millis(10), Duration::from_secs(1));
        assert_eq!(session.attempts(), 0);
        session.observe(Err(not_ready(404)));
        assert_eq!(session.attempts(), 1);
        session.observe(Ok(json!({})));
        assert_eq!(session.attempts(), 2);
    }

    #[tokio::test]
    async fn ready_on_third_attempt_makes_exactly_three_requests() {
        let mut service = MockScanService::new();
        let mut seq = Sequence::new();
        service
            .expect_post_form()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(not_ready(404)));
        service
            .expect_post_form()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"report": 3})));

        let payload = wait_for_report(
            &service,
            "abc",
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(payload, json!({"report": 3}));
    }

    #[tokio::test]
    async fn always_pending_terminates_in_timeout() {
        let mut service = MockScanService::new();
        service
            .expect_post_form()
            .returning(|_, _| Err(not_ready(404)));

        let started = Instant::now();
        let err = wait_for_report(
            &service,
            "abc",
            Duration::from_millis(10),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::Timeout { .. }));
        assert!(err.to_string().contains("abc"));
        // Bounded overrun: well under an unbounded hang.
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn non_retryable_status_fails_immediately() {
        let mut service = MockScanService::new();
        service.expect_post_form().times(1).returning(|_, _| {
            Err(ServiceError::Status {
                status: 401,
                body: None,
                message: "Unauthorized".to_string(),
            })
        });

        let started = Instant::now();
        let err = wait_for_report(
            &service,
            "abc",
            Duration::from_millis(10),
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn transport_failure_is_not_reclassified_as_timeout() {
        let mut service = MockScanService::new();
        service
            .expect_post_form()
            .times(1)
            .returning(|_, _| Err(ServiceError::Transport("connection refused".into())));

        let err = wait_for_report(
            &service,
            "abc",
            Duration::from_millis(10),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Network/unknown error: connection refused"
        );
    }
}
