use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff, applied uniformly to every
/// enrichment call site. The operation reports failure by returning
/// `None`; after the attempt budget is spent the caller supplies its own
/// fallback value.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Runs `op` up to `max_retries + 1` times, sleeping
    /// `base_delay * 2^attempt` between attempts.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 0..=self.max_retries {
            if let Some(value) = op().await {
                return Some(value);
            }
            if attempt < self.max_retries {
                tokio::time::sleep(self.base_delay * 2u32.pow(attempt)).await;
            }
        }
        None
    }
}
