//! Per-resource token-bucket rate limiter with a FIFO wait queue.
//!
//! The bucket uses a coarse fixed window: tokens refill to full once the
//! window has elapsed since the last refill. That matches the window-based
//! limits the gated upstreams enforce themselves, so finer-grained
//! accounting would buy nothing.
//!
//! Callers are never rejected. When no token is available they queue, and
//! are granted slots in arrival order as tokens come back, either through a
//! window refill or through another caller's release.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::debug;

/// Token budget for one named resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

/// Fallback for resources nobody configured explicitly. The limiter is
/// advisory infrastructure, not a hard gate.
pub const DEFAULT_CONFIG: RateLimitConfig = RateLimitConfig {
    max_requests: 10,
    window: Duration::from_secs(1),
};

/// IWLS tide-station API budget.
const IWLS_CONFIG: RateLimitConfig = RateLimitConfig {
    max_requests: 3,
    window: Duration::from_secs(1),
};

struct ResourceState {
    tokens: u32,
    last_refill: Instant,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl ResourceState {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            tokens: config.max_requests,
            last_refill: Instant::now(),
            waiters: VecDeque::new(),
        }
    }

    fn refill(&mut self, config: RateLimitConfig) {
        if self.last_refill.elapsed() >= config.window {
            self.tokens = config.max_requests;
            self.last_refill = Instant::now();
        }
    }

    /// Grant queued callers in FIFO order while tokens remain. A waiter that
    /// gave up (dropped receiver) does not consume a token.
    fn drain_waiters(&mut self) {
        while self.tokens > 0 {
            let Some(waiter) = self.waiters.pop_front() else {
                break;
            };
            if waiter.send(()).is_ok() {
                self.tokens -= 1;
            }
        }
    }
}

struct Inner {
    states: parking_lot::Mutex<HashMap<String, ResourceState>>,
    configs: HashMap<String, RateLimitConfig>,
}

impl Inner {
    fn config(&self, resource: &str) -> RateLimitConfig {
        self.configs.get(resource).copied().unwrap_or(DEFAULT_CONFIG)
    }

    fn release(&self, resource: &str) {
        let config = self.config(resource);
        let mut states = self.states.lock();
        let state = states
            .entry(resource.to_owned())
            .or_insert_with(|| ResourceState::new(config));
        state.tokens = (state.tokens + 1).min(config.max_requests);
        state.drain_waiters();
    }

    fn refill_and_drain(&self, resource: &str) {
        let config = self.config(resource);
        let mut states = self.states.lock();
        if let Some(state) = states.get_mut(resource) {
            state.refill(config);
            state.drain_waiters();
        }
    }
}

/// RAII slot for one gated call. Dropping the permit releases the slot back
/// to the bucket, so a fetch that fails still releases exactly once.
pub struct RateLimitPermit {
    inner: Arc<Inner>,
    resource: String,
}

impl Drop for RateLimitPermit {
    fn drop(&mut self) {
        self.inner.release(&self.resource);
    }
}

/// Token-bucket limiter shared by every call site that talks to a
/// rate-limited upstream.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Limiter with the built-in upstream budgets.
    #[must_use]
    pub fn new() -> Self {
        let mut configs = HashMap::new();
        configs.insert("iwls".to_owned(), IWLS_CONFIG);
        Self {
            inner: Arc::new(Inner {
                states: parking_lot::Mutex::new(HashMap::new()),
                configs,
            }),
        }
    }

    /// Add or override a resource budget. Intended for construction time;
    /// budgets are immutable once the limiter is in use.
    #[must_use]
    pub fn with_config(mut self, resource: &str, config: RateLimitConfig) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .unwrap_or_else(|| unreachable!("with_config called after limiter was shared"));
        inner.configs.insert(resource.to_owned(), config);
        self
    }

    /// Wait for a slot on `resource`.
    ///
    /// Refills the bucket first if the window has elapsed. Grants immediately
    /// when a token is available, otherwise queues the caller (FIFO) and arms
    /// a refill timer one window out so queued callers are never stranded
    /// waiting for an explicit release.
    pub async fn acquire_slot(&self, resource: &str) -> RateLimitPermit {
        let config = self.inner.config(resource);
        let waiter = {
            let mut states = self.inner.states.lock();
            let state = states
                .entry(resource.to_owned())
                .or_insert_with(|| ResourceState::new(config));
            state.refill(config);
            if state.tokens > 0 {
                state.tokens -= 1;
                None
            } else {
                let (grant, waiter) = oneshot::channel();
                state.waiters.push_back(grant);
                debug!(resource = %resource, "rate limiter exhausted, queuing caller");
                Some(waiter)
            }
        };

        if let Some(waiter) = waiter {
            let inner = Arc::clone(&self.inner);
            let name = resource.to_owned();
            tokio::spawn(async move {
                tokio::time::sleep(config.window).await;
                inner.refill_and_drain(&name);
            });
            // The sender lives in the resource state, which outlives us via
            // the Arc held below; a closed channel still means "go".
            let _ = waiter.await;
        }

        RateLimitPermit {
            inner: Arc::clone(&self.inner),
            resource: resource.to_owned(),
        }
    }

    /// Return one token to `resource` (capped at its maximum) and grant
    /// queued callers in FIFO order.
    ///
    /// Call sites normally rely on [`RateLimitPermit`]'s `Drop` instead of
    /// calling this directly.
    pub fn release(&self, resource: &str) {
        self.inner.release(resource);
    }
}
