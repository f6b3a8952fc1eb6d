//! Parallel task execution
//!
//! Fans a task list out over a bounded number of concurrent workers.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::resolver::ResolveCommand;
use super::supervisor::{Limits, ProcessSupervisor};
use crate::models::{ExecutionOutcome, TaskDescriptor, TaskReport};
use crate::results::ResultCollector;

/// Bounded-concurrency runner for one solver over many tasks
pub struct WorkerPool {
    parallelism: usize,
    supervisor: ProcessSupervisor,
    output_dir: PathBuf,
    resolver: Arc<dyn ResolveCommand>,
    collector: Arc<ResultCollector>,
}

impl WorkerPool {
    pub fn new(
        parallelism: usize,
        limits: Limits,
        output_dir: impl Into<PathBuf>,
        resolver: Arc<dyn ResolveCommand>,
        collector: Arc<ResultCollector>,
    ) -> Self {
        Self {
            parallelism: parallelism.max(1),
            supervisor: ProcessSupervisor::new(limits),
            output_dir: output_dir.into(),
            resolver,
            collector,
        }
    }

    /// Run every task and return one report per task, in input order
    pub async fn run(&self, tasks: Vec<TaskDescriptor>, solver: &str) -> Vec<TaskReport> {
        info!(
            "Running {} tasks with {} (max {} concurrent)",
            tasks.len(),
            solver,
            self.parallelism
        );

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks.iter().cloned() {
            let semaphore = semaphore.clone();
            let worker = Worker {
                supervisor: self.supervisor.clone(),
                output_dir: self.output_dir.clone(),
                resolver: self.resolver.clone(),
                collector: self.collector.clone(),
                solver: solver.to_string(),
            };

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                worker.run_task(task).await
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(tasks)
            .map(|(joined, task)| match joined {
                Ok(report) => report,
                Err(e) => {
                    error!("Worker for {} failed: {}", task, e);
                    TaskReport::new(task, ExecutionOutcome::LaunchError(e.to_string()), 0)
                }
            })
            .collect()
    }
}

/// Everything one spawned task needs, owned
struct Worker {
    supervisor: ProcessSupervisor,
    output_dir: PathBuf,
    resolver: Arc<dyn ResolveCommand>,
    collector: Arc<ResultCollector>,
    solver: String,
}

impl Worker {
    async fn run_task(self, task: TaskDescriptor) -> TaskReport {
        let command = match self.resolver.resolve(&self.solver, &task, &self.output_dir) {
            Ok(command) => command,
            Err(e) => {
                debug!("Not dispatching {}: {}", task, e);
                return TaskReport::invalid_solver(task, e.to_string());
            }
        };

        debug!("Starting {}", command);
        let started = Instant::now();
        let supervision = self.supervisor.supervise(&command).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            "{} (pid {:?}) finished in {}ms: {}",
            task, supervision.pid, duration_ms, supervision.outcome
        );

        let report = TaskReport::new(task, supervision.outcome, duration_ms);
        match self
            .collector
            .persist(&self.solver, &report.task, &supervision.output)
            .await
        {
            Ok(_) => report,
            Err(e) => {
                error!("Failed to store output for {}: {}", report.task, e);
                report.with_collect_error(e.to_string())
            }
        }
    }
}
