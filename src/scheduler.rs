//! Named recurring background jobs.
//!
//! Jobs are registered up front, started together, and stopped together.
//! A failing run is logged and swallowed; it never crashes the process and
//! never blocks the next tick. Stopping the scheduler aborts the job tasks,
//! so a long-running handler is interrupted deterministically rather than
//! merely denied its next tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// One scheduled unit of work.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
struct JobSpec {
    name: String,
    every: Duration,
    handler: Arc<dyn JobHandler>,
}

/// Registry and lifecycle for recurring jobs.
///
/// Explicitly constructed and passed to whoever registers jobs; no global
/// state, so tests get isolated instances.
#[derive(Default)]
pub struct Scheduler {
    jobs: parking_lot::Mutex<Vec<JobSpec>>,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named job running every `every`. Does not start it.
    pub fn schedule_job(
        &self,
        name: impl Into<String>,
        every: Duration,
        handler: Arc<dyn JobHandler>,
    ) {
        let name = name.into();
        debug!(job = %name, period_secs = every.as_secs(), "registered scheduled job");
        self.jobs.lock().push(JobSpec {
            name,
            every,
            handler,
        });
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Spawn every registered job's timer loop.
    pub fn start(&self) {
        let jobs = self.jobs.lock().clone();
        let mut handles = self.handles.lock();
        for job in jobs {
            handles.push(tokio::spawn(run_job(job)));
        }
        info!(count = handles.len(), "scheduler started");
    }

    /// Abort every running job task. In-flight runs are interrupted.
    pub fn stop(&self) {
        let mut handles = self.handles.lock();
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("scheduler stopped");
    }
}

async fn run_job(job: JobSpec) {
    let mut interval = tokio::time::interval(job.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the job fires on
    // schedule rather than at startup.
    interval.tick().await;
    loop {
        interval.tick().await;
        debug!(job = %job.name, "running scheduled job");
        match job.handler.run().await {
            Ok(()) => info!(job = %job.name, "scheduled job completed"),
            Err(error) => warn!(job = %job.name, %error, "scheduled job failed"),
        }
    }
}
