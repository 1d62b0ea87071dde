use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

// @module: Minimum-interval request limiter

/// Enforces a minimum spacing between consecutive outbound calls.
///
/// The lock is held while waiting, so concurrent callers are serialized
/// and each observes the full interval after the previous one.
#[derive(Debug)]
pub struct RateLimiter {
    // @field: Required spacing
    min_interval: Duration,

    // @field: When the last permit was handed out
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until a request may be sent and record it
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
