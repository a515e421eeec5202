//! Integration tests for the token-bucket rate limiter: FIFO grants, window
//! refill, defaults, and no-starvation properties.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;

use beachcast::limiter::{RateLimitConfig, RateLimiter};

fn limiter_with(resource: &str, max_requests: u32, window: Duration) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new().with_config(
        resource,
        RateLimitConfig {
            max_requests,
            window,
        },
    ))
}

/// Tokens available: the slot is granted without waiting.
#[tokio::test]
async fn grants_immediately_while_tokens_remain() {
    let limiter = limiter_with("x", 2, Duration::from_secs(60));

    let first = timeout(Duration::from_millis(10), limiter.acquire_slot("x")).await;
    assert!(first.is_ok());
    let second = timeout(Duration::from_millis(10), limiter.acquire_slot("x")).await;
    assert!(second.is_ok());
}

/// End-to-end example: one token, a second acquire queues, and a release
/// resolves it.
#[tokio::test]
async fn queued_caller_resolves_on_release() {
    let limiter = limiter_with("x", 1, Duration::from_secs(60));
    let permit = limiter.acquire_slot("x").await;

    let waiter = {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            let _permit = limiter.acquire_slot("x").await;
        })
    };

    // The waiter must still be queued while the permit is held.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    drop(permit);
    timeout(Duration::from_millis(200), waiter)
        .await
        .expect("queued caller should resolve after release")
        .expect("waiter task panicked");
}

/// With one token, three queued callers are granted in arrival order as
/// permits are released one by one.
#[tokio::test]
async fn queued_callers_are_granted_fifo() {
    let limiter = limiter_with("x", 1, Duration::from_secs(60));
    let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    let gate = limiter.acquire_slot("x").await;

    let mut tasks = JoinSet::new();
    for id in 0..3 {
        let limiter = Arc::clone(&limiter);
        let order = Arc::clone(&order);
        tasks.spawn(async move {
            let permit = limiter.acquire_slot("x").await;
            order.lock().push(id);
            // Dropping the permit hands the token to the next waiter.
            drop(permit);
        });
        // Serialize arrival so queue order is deterministic.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    drop(gate);
    while let Some(result) = tasks.join_next().await {
        result.expect("waiter task panicked");
    }

    assert_eq!(*order.lock(), vec![0, 1, 2]);
}

/// A queued caller is granted by the window refill even when nobody ever
/// releases.
#[tokio::test]
async fn window_refill_drains_the_queue() {
    let limiter = limiter_with("x", 1, Duration::from_millis(100));

    // Consume the token and never release it.
    let permit = limiter.acquire_slot("x").await;
    std::mem::forget(permit);

    let started = Instant::now();
    let _permit = timeout(Duration::from_millis(500), limiter.acquire_slot("x"))
        .await
        .expect("refill should grant the queued caller");
    assert!(started.elapsed() >= Duration::from_millis(90));
}

/// Unconfigured resources get the permissive default budget instead of
/// failing.
#[tokio::test]
async fn unconfigured_resources_use_the_default_budget() {
    let limiter = Arc::new(RateLimiter::new());

    for _ in 0..10 {
        let permit = timeout(
            Duration::from_millis(10),
            limiter.acquire_slot("never-configured"),
        )
        .await
        .expect("default budget grants ten slots immediately");
        std::mem::forget(permit);
    }

    // The eleventh queues but is still served by the one-second refill.
    let _permit = timeout(
        Duration::from_secs(2),
        limiter.acquire_slot("never-configured"),
    )
    .await
    .expect("queued caller resolves after refill");
}

/// Every acquire eventually resolves given releases: no starvation.
#[tokio::test]
async fn every_waiter_eventually_resolves() {
    let limiter = limiter_with("x", 2, Duration::from_millis(200));

    let mut tasks = JoinSet::new();
    for _ in 0..12 {
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let permit = limiter.acquire_slot("x").await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(permit);
        });
    }

    timeout(Duration::from_secs(5), async {
        while let Some(result) = tasks.join_next().await {
            result.expect("waiter task panicked");
        }
    })
    .await
    .expect("all waiters should be served");
}

/// Explicit release is capped at the configured maximum.
#[tokio::test]
async fn release_never_exceeds_the_token_cap() {
    let limiter = limiter_with("x", 1, Duration::from_secs(60));

    // Spurious releases must not mint extra tokens.
    limiter.release("x");
    limiter.release("x");

    let _held = limiter.acquire_slot("x").await;
    let second = timeout(Duration::from_millis(50), limiter.acquire_slot("x")).await;
    assert!(second.is_err(), "cap of one token must still hold");
}
