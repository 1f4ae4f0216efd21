use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Sliding-window rate limiter keyed by client.
///
/// Each client key owns an ordered queue of admission timestamps, oldest at
/// the front and never longer than the limit. A request is admitted while
/// the queue has room, or once the oldest admission has aged out of the
/// window; a denial leaves the queue untouched.
#[derive(Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting at most `limit` requests per client per
    /// second.
    pub fn new(limit: usize) -> Self {
        Self::with_window(limit, Duration::from_secs(1))
    }

    /// Same as [`RateLimiter::new`] with an explicit window length.
    pub fn with_window(limit: usize, window: Duration) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            limit,
            window,
        }
    }

    /// Decide whether `client_key` may proceed now, recording the admission
    /// if so. Check and mutation happen under one lock, so two concurrent
    /// requests for the same key cannot both claim the last slot.
    pub fn allow(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.lock_clients();
        let admissions = clients.entry(client_key.to_string()).or_default();

        if admissions.len() < self.limit {
            admissions.push_back(now);
            return true;
        }

        match admissions.front() {
            // Oldest admission still inside the window: every slot is taken.
            Some(&oldest) if now.duration_since(oldest) < self.window => false,
            Some(_) => {
                admissions.pop_front();
                admissions.push_back(now);
                true
            }
            // A limit of zero admits nothing.
            None => false,
        }
    }

    /// Number of client keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock_clients().len()
    }

    /// Drop windows whose newest admission is older than `max_idle`,
    /// returning how many were removed.
    pub fn prune_stale(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.lock_clients();
        let before = clients.len();

        clients.retain(|_, admissions| {
            admissions
                .back()
                .is_some_and(|&newest| now.duration_since(newest) < max_idle)
        });

        before - clients.len()
    }

    fn lock_clients(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        // A poisoned lock still holds a usable map.
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
