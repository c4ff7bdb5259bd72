//! Requests-per-minute ceiling shared by every model and retrieval call of a run.
//!
//! When the ceiling is reached callers wait for the oldest request to leave the
//! one-minute window; they never fail.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct RequestThrottle {
    max_per_window: usize,
    sent: Mutex<VecDeque<Instant>>,
}

impl RequestThrottle {
    /// Returns `None` for a ceiling of zero, meaning "unthrottled".
    pub fn per_minute(max_requests: u32) -> Option<Self> {
        if max_requests == 0 {
            return None;
        }
        Some(Self {
            max_per_window: max_requests as usize,
            sent: Mutex::new(VecDeque::new()),
        })
    }

    pub fn ceiling(&self) -> usize {
        self.max_per_window
    }

    /// Number of slots claimed within the current window.
    pub async fn recent(&self) -> usize {
        let sent = self.sent.lock().await;
        let now = Instant::now();
        sent.iter().filter(|at| now.duration_since(**at) < WINDOW).count()
    }

    /// Waits until a request slot is free, then claims it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while let Some(oldest) = sent.front() {
                    if now.duration_since(*oldest) >= WINDOW {
                        sent.pop_front();
                    } else {
                        break;
                    }
                }
                if sent.len() < self.max_per_window {
                    sent.push_back(now);
                    return;
                }
                match sent.front() {
                    Some(oldest) => WINDOW.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            debug!("Request ceiling of {}/min reached, waiting {:?}", self.max_per_window, wait);
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_zero_ceiling_disables_throttle() {
        assert!(RequestThrottle::per_minute(0).is_none());
        assert_eq!(RequestThrottle::per_minute(10).unwrap().ceiling(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_under_ceiling_do_not_wait() {
        let throttle = RequestThrottle::per_minute(3).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(throttle.recent().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_over_ceiling_waits_for_window() {
        let throttle = RequestThrottle::per_minute(2).unwrap();
        let start = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= WINDOW, "waited only {elapsed:?}");
        assert!(elapsed < WINDOW + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_with_spaced_requests() {
        let throttle = RequestThrottle::per_minute(2).unwrap();
        let start = Instant::now();
        throttle.acquire().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        throttle.acquire().await;
        // Third request must wait until the first leaves the window (t = 60s).
        throttle.acquire().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= WINDOW);
        assert!(elapsed < Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_share_the_ceiling() {
        let throttle = Arc::new(RequestThrottle::per_minute(1).unwrap());
        let start = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let throttle = Arc::clone(&throttle);
                tokio::spawn(async move { throttle.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(start.elapsed() >= WINDOW * 2);
    }
}
