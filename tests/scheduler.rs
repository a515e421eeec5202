//! Integration tests for the scheduler: periodic runs, failure isolation,
//! and lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use beachcast::error::AppError;
use beachcast::scheduler::{JobHandler, Scheduler};

struct CountingJob {
    runs: Arc<AtomicU32>,
    fail: bool,
}

#[async_trait]
impl JobHandler for CountingJob {
    async fn run(&self) -> Result<(), AppError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Api("synthetic job failure".to_owned()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn registered_jobs_run_on_their_period() {
    let scheduler = Scheduler::new();
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.schedule_job(
        "counting",
        Duration::from_millis(50),
        Arc::new(CountingJob {
            runs: Arc::clone(&runs),
            fail: false,
        }),
    );

    assert_eq!(scheduler.job_count(), 1);
    // Registration alone must not run anything.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(180)).await;
    scheduler.stop();

    let count = runs.load(Ordering::SeqCst);
    assert!((2..=4).contains(&count), "expected 2-4 runs, got {count}");
}

/// A failing run is logged and swallowed; the next tick still fires.
#[tokio::test]
async fn failing_job_keeps_ticking() {
    let scheduler = Scheduler::new();
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.schedule_job(
        "always-fails",
        Duration::from_millis(50),
        Arc::new(CountingJob {
            runs: Arc::clone(&runs),
            fail: true,
        }),
    );

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(180)).await;
    scheduler.stop();

    assert!(
        runs.load(Ordering::SeqCst) >= 2,
        "failures must not stop subsequent invocations"
    );
}

/// One job failing never affects another job's schedule.
#[tokio::test]
async fn jobs_are_isolated_from_each_other() {
    let scheduler = Scheduler::new();
    let failing_runs = Arc::new(AtomicU32::new(0));
    let healthy_runs = Arc::new(AtomicU32::new(0));

    scheduler.schedule_job(
        "failing",
        Duration::from_millis(50),
        Arc::new(CountingJob {
            runs: Arc::clone(&failing_runs),
            fail: true,
        }),
    );
    scheduler.schedule_job(
        "healthy",
        Duration::from_millis(50),
        Arc::new(CountingJob {
            runs: Arc::clone(&healthy_runs),
            fail: false,
        }),
    );

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(180)).await;
    scheduler.stop();

    assert!(failing_runs.load(Ordering::SeqCst) >= 2);
    assert!(healthy_runs.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn stop_halts_all_future_runs() {
    let scheduler = Scheduler::new();
    let runs = Arc::new(AtomicU32::new(0));
    scheduler.schedule_job(
        "counting",
        Duration::from_millis(30),
        Arc::new(CountingJob {
            runs: Arc::clone(&runs),
            fail: false,
        }),
    );

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.stop();

    let at_stop = runs.load(Ordering::SeqCst);
    assert!(at_stop >= 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), at_stop);
}
