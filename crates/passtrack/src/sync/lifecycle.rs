//! Engine lifecycle state machine.
//!
//! `Running → Draining → Stopped`, shared between the loops and whoever owns
//! the process (signal handler, test harness). Transitions are one-way; the
//! loops observe `Draining` between cycles and exit cleanly, relying on the
//! store's idempotent re-derivation for anything abandoned mid-flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// The engine's lifecycle states, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Loops run their cycles and re-arm.
    Running,
    /// Loops finish the current cycle boundary and exit.
    Draining,
    /// All loops have exited.
    Stopped,
}

/// Shared handle to the lifecycle state machine.
#[derive(Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Ask the loops to finish their current cycle and exit.
    pub fn drain(&self) {
        self.advance(LifecycleState::Draining);
    }

    /// Mark the engine fully stopped.
    pub fn stop(&self) {
        self.advance(LifecycleState::Stopped);
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    // States only move forward.
    fn advance(&self, next: LifecycleState) {
        self.tx.send_modify(|state| {
            if next > *state {
                *state = next;
            }
        });
    }

    /// Sleep for `duration`, waking early if the engine leaves `Running`.
    ///
    /// Returns `true` if the caller should run another cycle, `false` if it
    /// should exit.
    pub async fn pause(&self, duration: Duration) -> bool {
        let mut rx = self.subscribe();
        if *rx.borrow() != LifecycleState::Running {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_running(),
            _ = rx.wait_for(|state| *state != LifecycleState::Running) => false,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_one_way() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        lifecycle.stop();
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);

        // A late drain cannot move the state backwards.
        lifecycle.drain();
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_returns_true_while_running() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.pause(Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_wakes_early_on_drain() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.pause(Duration::from_secs(3600)).await })
        };
        tokio::task::yield_now().await;
        lifecycle.drain();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_immediate_when_already_draining() {
        let lifecycle = Lifecycle::new();
        lifecycle.drain();
        assert!(!lifecycle.pause(Duration::from_secs(3600)).await);
    }
}
