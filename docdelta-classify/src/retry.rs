use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::reviewer::{ChangeReviewer, ModelJudgment, ReviewRequest};
use crate::ReviewError;

/// Bounded attempts with a per-attempt timeout and growing backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub attempts: u32,
    /// Time allowed for one model call
    pub attempt_timeout_ms: u64,
    /// Pause before the second attempt
    pub initial_backoff_ms: u64,
    /// Growth factor of the pause between attempts
    pub backoff_factor: f64,
    /// Longest pause between attempts
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            attempt_timeout_ms: 30_000,
            initial_backoff_ms: 750,
            backoff_factor: 1.75,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Pause after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_backoff_ms as f64;
        for _ in 1..attempt {
            delay = (delay * self.backoff_factor).min(self.max_backoff_ms as f64);
        }
        Duration::from_millis(delay.min(self.max_backoff_ms as f64) as u64)
    }

    /// Worst-case time spent in [`review`](Self::review).
    pub fn budget(&self) -> Duration {
        let attempts = self.attempts.max(1);
        let pauses: Duration = (1..attempts).map(|a| self.backoff(a)).sum();
        self.attempt_timeout() * attempts + pauses
    }

    /// Run the review, retrying retryable failures.
    pub async fn review(
        &self,
        reviewer: &dyn ChangeReviewer,
        request: &ReviewRequest,
    ) -> Result<ModelJudgment, ReviewError> {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match timeout(self.attempt_timeout(), reviewer.review(request)).await {
                Ok(result) => result,
                Err(_) => Err(ReviewError::Timeout(self.attempt_timeout())),
            };

            match result {
                Ok(judgment) => return Ok(judgment),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let pause = self.backoff(attempt);
                    warn!(
                        model = reviewer.model(),
                        attempt,
                        error = %err,
                        pause_ms = pause.as_millis() as u64,
                        "model review failed, retrying"
                    );
                    sleep(pause).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
