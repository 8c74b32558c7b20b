//! Throttle middleware (spec.md §4.4, §5): caps the router's global
//! message-processing rate at `messages_per_second`. A background task
//! refills a semaphore at the configured rate; each handler invocation
//! acquires one permit before running.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct Throttle {
    semaphore: Arc<Semaphore>,
}

impl Throttle {
    /// `messages_per_second` governs both the refill interval and the burst
    /// capacity, so the router never holds more than one second's worth of
    /// permits at a time.
    pub fn new(messages_per_second: f64) -> Self {
        let capacity = messages_per_second.ceil().max(1.0) as usize;
        let semaphore = Arc::new(Semaphore::new(capacity));
        let refill_interval = Duration::from_secs_f64(1.0 / messages_per_second.max(1.0));

        let refill = semaphore.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refill_interval);
            loop {
                ticker.tick().await;
                if refill.available_permits() < capacity {
                    refill.add_permits(1);
                }
            }
        });

        Self { semaphore }
    }

    /// Acquires and forgets one permit: the permit is consumed for good,
    /// not returned when the caller's guard drops, so throughput is bounded
    /// by the ticker's refill rate (`messages_per_second`), not by how many
    /// handlers happen to be in flight at once.
    pub async fn acquire(&self) {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("throttle semaphore is never closed")
            .forget();
    }
}
