//! Collapses bursts of input events (keystrokes in the search box) into one
//! re-query after the input has been quiet for a fixed delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the delay. Returns `true` only for the latest caller; every
    /// earlier caller still sleeping gets `false` and should do nothing.
    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.delay.is_zero() {
            return true;
        }
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_keystroke_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (first, second, third) = tokio::join!(
            debouncer.settle(),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                debouncer.settle().await
            },
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                debouncer.settle().await
            },
        );
        assert!(!first);
        assert!(!second);
        assert!(third);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_out_inputs_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.settle().await);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(debouncer.settle().await);
    }

    #[tokio::test]
    async fn zero_delay_fires_immediately() {
        let debouncer = Debouncer::new(Duration::ZERO);
        assert!(debouncer.settle().await);
    }
}
