use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ClientConfigError;

/// Default trailing window the provider counts requests over.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Slack added to every computed wait so a slot has really expired on wake-up.
const WAKE_MARGIN: Duration = Duration::from_millis(50);

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
///
/// Cloning shares the underlying window, so every clone throttles against the
/// same budget.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Result<Self, ClientConfigError> {
        if max_requests == 0 {
            return Err(ClientConfigError::ZeroRateLimit);
        }
        if window.is_zero() {
            return Err(ClientConfigError::ZeroWindow);
        }
        Ok(Self {
            timestamps: Arc::new(Mutex::new(VecDeque::with_capacity(max_requests))),
            max_requests,
            window,
        })
    }

    pub fn per_minute(max_requests: usize) -> Result<Self, ClientConfigError> {
        Self::new(max_requests, DEFAULT_WINDOW)
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for capacity and record the call in one critical section.
    ///
    /// Returns the timestamp recorded for this call. The lock is released while
    /// sleeping; after waking the window is re-checked because other waiters
    /// may have taken the freed slot.
    pub async fn acquire(&self) -> Instant {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();
            Self::prune(&mut ts, now, self.window);

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return now;
            }

            let sleep_dur = match ts.front() {
                Some(&oldest) => {
                    (oldest + self.window).saturating_duration_since(now) + WAKE_MARGIN
                }
                None => WAKE_MARGIN,
            };
            drop(ts);
            tracing::info!(
                "Rate limit reached ({} calls/{}s), waiting {:.2}s for a slot",
                self.max_requests,
                self.window.as_secs(),
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }

    /// Number of calls currently counted inside the trailing window.
    pub async fn calls_in_window(&self) -> usize {
        let mut ts = self.timestamps.lock().await;
        Self::prune(&mut ts, Instant::now(), self.window);
        ts.len()
    }

    fn prune(ts: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&front) = ts.front() {
            if now.duration_since(front) >= window {
                ts.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_rejected() {
        assert_eq!(
            RateLimiter::per_minute(0).unwrap_err(),
            ClientConfigError::ZeroRateLimit
        );
        assert_eq!(
            RateLimiter::new(5, Duration::ZERO).unwrap_err(),
            ClientConfigError::ZeroWindow
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_limit_do_not_wait() {
        let limiter = RateLimiter::per_minute(3).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.calls_in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_call_blocks_until_oldest_ages_out() {
        let limiter = RateLimiter::per_minute(2).unwrap();
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let third = limiter.acquire().await;
        assert!(third.duration_since(start) >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_never_exceeded_under_concurrency() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10)).unwrap();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let l = limiter.clone();
            handles.push(tokio::spawn(async move { l.acquire().await }));
        }
        let mut stamps = Vec::new();
        for h in handles {
            stamps.push(h.await.unwrap());
        }
        stamps.sort();
        // Any 4 consecutive calls must span at least one full window.
        for w in stamps.windows(4) {
            assert!(w[3].duration_since(w[0]) >= Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_age_out_of_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(5)).unwrap();
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(limiter.calls_in_window().await, 0);
    }
}
