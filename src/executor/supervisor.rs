//! Supervised process execution
//!
//! Launches one command as an isolated process group and races its natural
//! exit against the wall-clock limit and the memory monitor.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::monitor::{MemoryMonitor, MonitorExit, MonitorState};
use super::process_tree::ProcessTree;
use crate::config::HarnessConfig;
use crate::models::{CapturedOutput, CommandLine, ExecutionOutcome};

/// How long to keep draining pipes after the tree is gone
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Resource limits for one task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub timeout: Duration,
    pub memory_cap_bytes: u64,
    pub sample_interval: Duration,
}

impl Limits {
    pub fn new(timeout: Duration, memory_cap_bytes: u64) -> Self {
        Self {
            timeout,
            memory_cap_bytes,
            sample_interval: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.timeout(), config.memory_cap_bytes())
            .with_sample_interval(config.sample_interval())
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }
}

/// Everything a supervised run produced
#[derive(Debug)]
pub struct Supervision {
    pub outcome: ExecutionOutcome,
    pub output: CapturedOutput,
    /// Root pid (and process group id), if the process was launched
    pub pid: Option<u32>,
}

impl Supervision {
    fn launch_error(message: String) -> Self {
        Self {
            output: CapturedOutput::from_error(message.clone()),
            outcome: ExecutionOutcome::LaunchError(message),
            pid: None,
        }
    }
}

/// Runs commands under the configured limits
#[derive(Clone, Debug)]
pub struct ProcessSupervisor {
    limits: Limits,
}

impl ProcessSupervisor {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Run one command to a final outcome. No process from the tree is left
    /// running when this returns.
    pub async fn supervise(&self, command: &CommandLine) -> Supervision {
        let mut child = match spawn(command) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to launch {}: {}", command, e);
                return Supervision::launch_error(e.to_string());
            }
        };

        let Some(pid) = child.id() else {
            return Supervision::launch_error("process exited before supervision".to_string());
        };
        debug!(pid, "Launched {}", command);

        let tree = ProcessTree::new(pid);
        let state = MonitorState::new();
        let monitor = MemoryMonitor::new(
            tree,
            self.limits.memory_cap_bytes,
            self.limits.sample_interval,
            state.clone(),
        )
        .spawn();

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let waited = tokio::time::timeout(self.limits.timeout, child.wait()).await;
        let finished_first = state.finish();

        let outcome = match waited {
            Ok(_) if !finished_first => ExecutionOutcome::MemoryExceeded,
            Ok(Ok(status)) => ExecutionOutcome::Completed(exit_code(status)),
            Ok(Err(e)) => ExecutionOutcome::LaunchError(format!("failed to wait: {e}")),
            Err(_) if !finished_first => {
                reap(&mut child, &tree).await;
                ExecutionOutcome::MemoryExceeded
            }
            Err(_) => {
                warn!(pid, "Timed out after {}s", self.limits.timeout.as_secs());
                reap(&mut child, &tree).await;
                ExecutionOutcome::TimedOut
            }
        };

        // Sweep stragglers left in the group after the root exited.
        tree.kill_group();
        match monitor.await {
            Ok(MonitorExit::MemoryExceeded { resident_bytes }) => {
                debug!(pid, resident_bytes, "Tree was killed over the memory cap");
            }
            Ok(_) => {}
            Err(e) => warn!(pid, "Memory monitor failed: {e}"),
        }

        let output = match outcome {
            ExecutionOutcome::TimedOut => {
                stdout.abort();
                stderr.abort();
                CapturedOutput::default()
            }
            _ => CapturedOutput::new(collect(stdout).await, collect(stderr).await),
        };

        debug!(pid, "Finished with {}", outcome);
        Supervision {
            outcome,
            output,
            pid: Some(pid),
        }
    }
}

fn spawn(command: &CommandLine) -> std::io::Result<Child> {
    Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
}

/// Kill the tree while the root is still unreaped, then reap it
async fn reap(child: &mut Child, tree: &ProcessTree) {
    let tree = *tree;
    let _ = tokio::task::spawn_blocking(move || tree.kill()).await;
    if let Err(e) = child.wait().await {
        warn!(pid = tree.root(), "Failed to reap killed process: {e}");
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("Pipe read ended early: {e}");
            }
        }
        buf
    })
}

async fn collect(reader: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = reader.abort_handle();
    match tokio::time::timeout(DRAIN_GRACE, reader).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            warn!("Output reader failed: {e}");
            Vec::new()
        }
        Err(_) => {
            warn!("Output pipe still held open by an escaped process, discarding");
            abort.abort();
            Vec::new()
        }
    }
}

/// Exit code, or the negated signal number for signal deaths
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}
