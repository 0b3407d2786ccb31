//! Fixed-delay request throttle.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces outbound requests by a fixed delay.
///
/// Every caller of [`Throttle::wait`] is delayed until at least `delay` has
/// passed since the previous caller was released.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle with an explicit delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Create a throttle from a calls-per-minute budget (`60 / calls` seconds).
    pub fn per_minute(calls_per_minute: u32) -> Self {
        if calls_per_minute == 0 {
            return Self::new(Duration::ZERO);
        }
        Self::new(Duration::from_secs_f64(60.0 / calls_per_minute as f64))
    }

    /// Get the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the next request slot.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
