//! Process tree inspection and termination
//!
//! A supervised command is launched as the leader of its own process group.
//! Descendants are found by walking parent links in `/proc` (read through the
//! `procfs` crate), which also catches children that moved to another process
//! group.

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Root process of a supervised tree. The root pid doubles as the process
/// group id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessTree {
    root: u32,
}

/// Minimal view of `/proc/<pid>/stat`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ProcStat {
    pid: u32,
    state: char,
    ppid: u32,
    pgrp: i32,
}

impl ProcessTree {
    pub fn new(root: u32) -> Self {
        Self { root }
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    /// Pids of all live descendants of the root, breadth first
    #[cfg(test)]
    pub fn descendants(&self) -> Vec<u32> {
        self.descendant_stats().into_iter().map(|s| s.pid).collect()
    }

    /// Resident memory of the root plus all live descendants.
    /// `None` once the root itself is gone.
    pub fn resident_bytes(&self) -> Option<u64> {
        let root = proc_info::rss_bytes(self.root)?;
        let children: u64 = self
            .descendant_stats()
            .iter()
            .filter_map(|s| proc_info::rss_bytes(s.pid))
            .sum();
        Some(root + children)
    }

    /// Kill the whole tree: the process group first, then any descendant that
    /// escaped into another group. Returns the number of signals delivered.
    pub fn kill(&self) -> usize {
        let descendants = self.descendant_stats();
        let mut delivered = usize::from(self.kill_group());

        for stat in descendants.iter().filter(|s| s.pgrp != self.pgid()) {
            if send_kill(stat.pid) {
                delivered += 1;
            }
        }

        debug!(
            root = self.root,
            descendants = descendants.len(),
            delivered,
            "Killed process tree"
        );
        delivered
    }

    /// SIGKILL the root's process group. Safe after the root was reaped: the
    /// group id stays reserved while any member is alive.
    pub fn kill_group(&self) -> bool {
        match killpg(Pid::from_raw(self.pgid()), Signal::SIGKILL) {
            Ok(()) => true,
            Err(Errno::ESRCH) => false,
            Err(e) => {
                debug!(pgid = self.pgid(), "killpg failed: {e}");
                false
            }
        }
    }

    fn pgid(&self) -> i32 {
        self.root as i32
    }

    fn descendant_stats(&self) -> Vec<ProcStat> {
        let all = proc_info::all_stats();
        let mut children: HashMap<u32, Vec<ProcStat>> = HashMap::new();
        for stat in all {
            children.entry(stat.ppid).or_default().push(stat);
        }

        let mut found = Vec::new();
        let mut seen = HashSet::from([self.root]);
        let mut queue = VecDeque::from([self.root]);
        while let Some(pid) = queue.pop_front() {
            for child in children.get(&pid).into_iter().flatten() {
                if child.state != 'Z' && seen.insert(child.pid) {
                    queue.push_back(child.pid);
                    found.push(*child);
                }
            }
        }
        found
    }
}

/// Whether a pid refers to a live (non-zombie) process
#[cfg(test)]
pub fn is_alive(pid: u32) -> bool {
    proc_info::stat(pid).is_some_and(|s| s.state != 'Z')
}

fn send_kill(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            debug!(pid, "kill failed: {e}");
            false
        }
    }
}

#[cfg(target_os = "linux")]
mod proc_info {
    use super::ProcStat;
    use procfs::process::{all_processes, Process};

    #[cfg(test)]
    pub(super) fn stat(pid: u32) -> Option<ProcStat> {
        let process = Process::new(i32::try_from(pid).ok()?).ok()?;
        from_process(&process)
    }

    /// Every process still readable at scan time. Processes that exit
    /// mid-scan are skipped.
    pub(super) fn all_stats() -> Vec<ProcStat> {
        let Ok(processes) = all_processes() else {
            return Vec::new();
        };
        processes
            .flatten()
            .filter_map(|process| from_process(&process))
            .collect()
    }

    /// Resident set size in bytes, from `statm`
    pub(super) fn rss_bytes(pid: u32) -> Option<u64> {
        let process = Process::new(i32::try_from(pid).ok()?).ok()?;
        let statm = process.statm().ok()?;
        Some(statm.resident * procfs::page_size())
    }

    fn from_process(process: &Process) -> Option<ProcStat> {
        let stat = process.stat().ok()?;
        Some(ProcStat {
            pid: u32::try_from(stat.pid).ok()?,
            state: stat.state,
            ppid: u32::try_from(stat.ppid).ok()?,
            pgrp: stat.pgrp,
        })
    }
}

// No procfs: trees are reduced to their process group.
#[cfg(not(target_os = "linux"))]
mod proc_info {
    use super::ProcStat;

    #[cfg(test)]
    pub(super) fn stat(_pid: u32) -> Option<ProcStat> {
        None
    }

    pub(super) fn all_stats() -> Vec<ProcStat> {
        Vec::new()
    }

    pub(super) fn rss_bytes(_pid: u32) -> Option<u64> {
        None
    }
}
