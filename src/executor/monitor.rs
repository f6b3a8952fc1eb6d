//! Per-task memory monitoring
//!
//! Samples the resident memory of a supervised process tree and kills the tree
//! once it exceeds the configured cap.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::process_tree::ProcessTree;

const RUNNING: u8 = 0;
const DONE: u8 = 1;
const MEMORY_EXCEEDED: u8 = 2;

/// State shared between a supervisor and its monitor for one task.
///
/// The phase leaves `RUNNING` exactly once: whichever side claims it first
/// decides whether the task ended normally or by memout.
#[derive(Debug)]
pub struct MonitorState {
    phase: AtomicU8,
    done: watch::Sender<bool>,
}

impl MonitorState {
    pub fn new() -> Arc<Self> {
        let (done, _) = watch::channel(false);
        Arc::new(Self {
            phase: AtomicU8::new(RUNNING),
            done,
        })
    }

    /// Claim the `Done` phase and wake the monitor. Returns false when the
    /// monitor already claimed memout.
    pub fn finish(&self) -> bool {
        let claimed = self.claim(DONE);
        self.done.send_replace(true);
        claimed
    }

    /// Claim the memout phase. Returns false when the task already finished.
    fn claim_memory_exceeded(&self) -> bool {
        self.claim(MEMORY_EXCEEDED)
    }

    fn claim(&self, phase: u8) -> bool {
        self.phase
            .compare_exchange(RUNNING, phase, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    #[cfg(test)]
    pub fn memory_exceeded(&self) -> bool {
        self.phase.load(Ordering::Acquire) == MEMORY_EXCEEDED
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.done.subscribe()
    }
}

/// Why a monitor stopped sampling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorExit {
    /// The supervisor signalled completion
    Finished,
    /// The root process disappeared between samples
    Vanished,
    /// The cap was exceeded and the tree was killed
    MemoryExceeded { resident_bytes: u64 },
}

/// Background memory watcher for one process tree
pub struct MemoryMonitor {
    tree: ProcessTree,
    cap_bytes: u64,
    interval: Duration,
    state: Arc<MonitorState>,
}

impl MemoryMonitor {
    pub fn new(
        tree: ProcessTree,
        cap_bytes: u64,
        interval: Duration,
        state: Arc<MonitorState>,
    ) -> Self {
        Self {
            tree,
            cap_bytes,
            interval,
            state,
        }
    }

    /// Run the sampling loop on the runtime
    pub fn spawn(self) -> JoinHandle<MonitorExit> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> MonitorExit {
        let mut done = self.state.subscribe();

        loop {
            if self.state.is_done() {
                return MonitorExit::Finished;
            }

            let tree = self.tree;
            let sample = tokio::task::spawn_blocking(move || tree.resident_bytes())
                .await
                .ok()
                .flatten();

            match sample {
                None => {
                    debug!(root = self.tree.root(), "Monitored process is gone");
                    return MonitorExit::Vanished;
                }
                Some(resident_bytes) if resident_bytes > self.cap_bytes => {
                    if !self.state.claim_memory_exceeded() {
                        return MonitorExit::Finished;
                    }
                    warn!(
                        root = self.tree.root(),
                        resident_mb = resident_bytes / (1024 * 1024),
                        cap_mb = self.cap_bytes / (1024 * 1024),
                        "Memory cap exceeded, killing process tree"
                    );
                    let tree = self.tree;
                    let _ = tokio::task::spawn_blocking(move || tree.kill()).await;
                    return MonitorExit::MemoryExceeded { resident_bytes };
                }
                Some(resident_bytes) => {
                    debug!(root = self.tree.root(), resident_bytes, "Memory sample");
                }
            }

            // Any change means done was signalled; re-checked at the top.
            tokio::select! {
                _ = done.changed() => {}
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::process::Command;

    #[test]
    fn test_first_claim_wins() {
        let state = MonitorState::new();
        assert!(state.claim_memory_exceeded());
        assert!(!state.finish());
        assert!(state.memory_exceeded());
        assert!(state.is_done());

        let state = MonitorState::new();
        assert!(state.finish());
        assert!(!state.claim_memory_exceeded());
        assert!(!state.memory_exceeded());
    }

    #[tokio::test]
    async fn test_monitor_stops_promptly_when_done() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let tree = ProcessTree::new(child.id().unwrap());
        let state = MonitorState::new();

        let handle = MemoryMonitor::new(
            tree,
            u64::MAX,
            Duration::from_secs(60),
            state.clone(),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let start = Instant::now();
        state.finish();
        let exit = handle.await.unwrap();

        assert_eq!(exit, MonitorExit::Finished);
        assert!(start.elapsed() < Duration::from_secs(5));

        child.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_monitor_kills_tree_over_cap() {
        let mut child = Command::new("sleep")
            .arg("30")
            .process_group(0)
            .spawn()
            .unwrap();
        let tree = ProcessTree::new(child.id().unwrap());
        let state = MonitorState::new();

        let exit = MemoryMonitor::new(tree, 0, Duration::from_millis(50), state.clone())
            .run()
            .await;

        assert!(matches!(exit, MonitorExit::MemoryExceeded { .. }));
        assert!(state.memory_exceeded());
        assert!(!state.finish());

        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_monitor_does_not_act_after_finish() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let tree = ProcessTree::new(child.id().unwrap());
        let state = MonitorState::new();
        state.finish();

        let exit = MemoryMonitor::new(tree, 0, Duration::from_millis(10), state.clone())
            .run()
            .await;

        assert_eq!(exit, MonitorExit::Finished);
        assert!(!state.memory_exceeded());
        assert!(child.try_wait().unwrap().is_none());

        child.kill().await.unwrap();
    }
}
