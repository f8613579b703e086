//! Shared digest nonce with periodic rotation.
//!
//! The current nonce lives in an `ArcSwap` so request handlers read it
//! without locking. Only the rotation worker (or an explicit `rotate()`)
//! writes it.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::debug;
use xacml_core::nonce::compute_nonce;
use xacml_core::{ClockSource, SystemClock};

use super::worker::{BackgroundRunnable, BackgroundWorker};

/// Holds the nonce currently in effect. Cloning shares the same slot.
#[derive(Clone)]
pub struct NonceManager {
    current: Arc<ArcSwap<String>>,
    clock: Arc<dyn ClockSource>,
}

impl NonceManager {
    /// Creates a manager with a freshly generated nonce.
    #[must_use]
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        let initial = generate(clock.as_ref());
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
            clock,
        }
    }

    /// Snapshot of the nonce in effect right now.
    #[must_use]
    pub fn current(&self) -> Arc<String> {
        self.current.load_full()
    }

    /// Replaces the nonce and returns the new value.
    pub fn rotate(&self) -> Arc<String> {
        let next = Arc::new(generate(self.clock.as_ref()));
        self.current.store(Arc::clone(&next));
        debug!("digest nonce rotated");
        next
    }

    /// Starts a worker that rotates the nonce every `interval`.
    ///
    /// If the worker stops, the last nonce stays in effect.
    #[must_use]
    pub fn spawn_rotation(&self, interval: Duration) -> BackgroundWorker<NonceRotator> {
        BackgroundWorker::start(
            NonceRotator {
                nonces: self.clone(),
            },
            interval,
        )
    }
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for NonceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceManager").finish_non_exhaustive()
    }
}

fn generate(clock: &dyn ClockSource) -> String {
    compute_nonce(clock.now_secs(), rand::random::<u64>())
}

// ---------------------------------------------------------------------------
// Rotation worker
// ---------------------------------------------------------------------------

/// On-demand tasks for the rotation worker.
#[derive(Debug)]
pub enum NonceTask {
    /// Rotate immediately, independent of the tick.
    RotateNow,
}

/// Rotates the shared nonce on every tick.
pub struct NonceRotator {
    nonces: NonceManager,
}

#[async_trait]
impl BackgroundRunnable for NonceRotator {
    type Task = NonceTask;

    async fn run(&mut self, task: NonceTask) {
        match task {
            NonceTask::RotateNow => {
                self.nonces.rotate();
            }
        }
    }

    async fn on_tick(&mut self) {
        self.nonces.rotate();
    }

    async fn shutdown(&mut self) {
        debug!("nonce rotation stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_replaces_current() {
        let nonces = NonceManager::default();
        let before = nonces.current();
        let after = nonces.rotate();
        assert_ne!(before, after);
        assert_eq!(nonces.current(), after);
        assert_eq!(after.len(), 64);
    }

    #[test]
    fn clones_share_the_same_slot() {
        let a = NonceManager::default();
        let b = a.clone();
        a.rotate();
        assert_eq!(a.current(), b.current());
    }

    #[tokio::test(start_paused = true)]
    async fn nonce_is_stable_within_an_interval_and_changes_across_one() {
        let nonces = NonceManager::default();
        let mut worker = nonces.spawn_rotation(Duration::from_secs(60));
        let first = nonces.current();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(nonces.current(), first);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_ne!(nonces.current(), first);

        worker.stop().await;
    }

    #[tokio::test]
    async fn rotate_now_task_rotates_immediately() {
        let nonces = NonceManager::default();
        let mut worker = nonces.spawn_rotation(Duration::from_secs(3600));
        let first = nonces.current();

        worker.submit(NonceTask::RotateNow).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_ne!(nonces.current(), first);

        worker.stop().await;
    }

    #[tokio::test]
    async fn last_nonce_survives_stopped_worker() {
        let nonces = NonceManager::default();
        let mut worker = nonces.spawn_rotation(Duration::from_secs(3600));
        worker.stop().await;

        let snapshot = nonces.current();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(nonces.current(), snapshot);
    }
}
