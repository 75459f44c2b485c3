//! Queue-wide rate-limit cool-down.
//!
//! The upstream rate limit is shared by every in-flight request, so backing
//! off one job at a time does not help. When any provider call reports a
//! transient failure the gate is tripped, and every worker of the gated
//! queue waits at its next checkpoint until the window has passed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default cool-down after a rate-limit response.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Pause gate shared by all workers of one queue.
pub struct CooldownGate {
    name: &'static str,
    cooldown: Duration,
    paused_until: watch::Sender<Option<Instant>>,
    trips: AtomicU64,
}

impl CooldownGate {
    pub fn new(name: &'static str, cooldown: Duration) -> Self {
        let (paused_until, _) = watch::channel(None);
        Self {
            name,
            cooldown,
            paused_until,
            trips: AtomicU64::new(0),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Pauses the queue for the cool-down, or `retry_after` if longer.
    ///
    /// Tripping an already paused gate extends the pause only if the new
    /// window ends later.
    pub fn trip(&self, retry_after: Option<Duration>) {
        let window = retry_after.map_or(self.cooldown, |r| r.max(self.cooldown));
        let until = Instant::now() + window;
        let extended = self.paused_until.send_if_modified(|current| match current {
            Some(existing) if *existing >= until => false,
            _ => {
                *current = Some(until);
                true
            }
        });
        if extended {
            self.trips.fetch_add(1, Ordering::Relaxed);
            warn!(
                queue = self.name,
                cooldown_ms = window.as_millis() as u64,
                "Rate limited, pausing queue"
            );
        }
    }

    /// True while a cool-down window is open.
    pub fn is_paused(&self) -> bool {
        self.paused_until
            .borrow()
            .is_some_and(|until| until > Instant::now())
    }

    /// Number of times the gate was tripped or extended.
    pub fn trips(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }

    /// Waits until no cool-down window is open.
    pub async fn wait_ready(&self) {
        loop {
            let until = *self.paused_until.borrow();
            match until {
                Some(until) if until > Instant::now() => {
                    tokio::time::sleep_until(until).await;
                }
                Some(until) => {
                    let resumed = self.paused_until.send_if_modified(|current| {
                        if *current == Some(until) {
                            *current = None;
                            true
                        } else {
                            false
                        }
                    });
                    if resumed {
                        info!(queue = self.name, "Cool-down elapsed, resuming queue");
                    }
                }
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_gate_does_not_wait() {
        let gate = CooldownGate::new("test", Duration::from_secs(60));
        assert!(!gate.is_paused());
        tokio::time::timeout(Duration::from_millis(50), gate.wait_ready())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_trip_pauses_for_cooldown() {
        let gate = CooldownGate::new("test", Duration::from_millis(60));
        gate.trip(None);
        assert!(gate.is_paused());
        assert_eq!(gate.trips(), 1);

        let start = std::time::Instant::now();
        gate.wait_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(55));
        assert!(!gate.is_paused());
    }

    #[tokio::test]
    async fn test_retry_after_longer_than_cooldown_wins() {
        let gate = CooldownGate::new("test", Duration::from_millis(10));
        gate.trip(Some(Duration::from_millis(80)));

        let start = std::time::Instant::now();
        gate.wait_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(75));
    }

    #[tokio::test]
    async fn test_concurrent_trips_do_not_shorten_window() {
        let gate = CooldownGate::new("test", Duration::from_millis(80));
        gate.trip(Some(Duration::from_millis(200)));
        gate.trip(None);
        assert_eq!(gate.trips(), 1);
    }

    #[tokio::test]
    async fn test_all_waiters_released_together() {
        let gate = Arc::new(CooldownGate::new("test", Duration::from_millis(50)));
        gate.trip(None);

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait_ready().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
