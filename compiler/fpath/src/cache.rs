//! In-memory program cache with single-flight compilation.
//!
//! Lookups never block each other. A miss takes the per-key gate, checks
//! the cache again and only then compiles, so concurrent requests for one
//! key compile once while requests for other keys proceed.
//!
//! Keys are 64-bit hashes. Each entry keeps the template it was compiled
//! from, and a hit only counts when the template matches.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{ContentHash, Program};

struct Entry {
    template: Box<str>,
    program: Arc<Program>,
    /// Milliseconds since the cache epoch.
    last_access: AtomicU64,
}

pub(crate) struct RenderCache {
    entries: DashMap<ContentHash, Entry>,
    gates: DashMap<ContentHash, Arc<Mutex<()>>>,
    capacity: usize,
    ttl: Option<Duration>,
    epoch: Instant,
    compilations: AtomicUsize,
}

impl RenderCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        RenderCache {
            entries: DashMap::new(),
            gates: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            epoch: Instant::now(),
            compilations: AtomicUsize::new(0),
        }
    }

    fn millis(&self, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(self.epoch).as_millis()).unwrap_or(u64::MAX)
    }

    pub fn get(&self, key: ContentHash, template: &str) -> Option<Arc<Program>> {
        let entry = self.entries.get(&key)?;
        if *entry.template != *template {
            debug!(%key, "cache key collision");
            return None;
        }
        entry.last_access.store(self.millis(Instant::now()), Ordering::Relaxed);
        trace!(%key, "memory cache hit");
        Some(Arc::clone(&entry.program))
    }

    /// Cached program for `key`, compiling it at most once at a time.
    ///
    /// Failures are not cached: the next request compiles again.
    pub fn get_or_compile<E>(
        &self,
        key: ContentHash,
        template: &str,
        compile: impl FnOnce() -> Result<Arc<Program>, E>,
    ) -> Result<Arc<Program>, E> {
        if let Some(program) = self.get(key, template) {
            return Ok(program);
        }

        let gate = Arc::clone(self.gates.entry(key).or_default().value());
        let result = {
            let _guard = gate.lock();
            match self.get(key, template) {
                Some(program) => Ok(program),
                None => {
                    self.compilations.fetch_add(1, Ordering::Relaxed);
                    let result = compile();
                    if let Ok(program) = &result {
                        self.insert(key, template, Arc::clone(program));
                    }
                    result
                }
            }
        };
        self.gates.remove_if(&key, |_, g| Arc::ptr_eq(g, &gate));
        result
    }

    /// Store `program`, replacing whatever `key` held.
    fn insert(&self, key: ContentHash, template: &str, program: Arc<Program>) {
        let last_access = AtomicU64::new(self.millis(Instant::now()));
        self.entries.insert(key, Entry { template: template.into(), program, last_access });
        while self.entries.len() > self.capacity {
            // Collect first: removing while iterating would deadlock the shard.
            let oldest = self
                .entries
                .iter()
                .filter(|e| *e.key() != key)
                .min_by_key(|e| e.last_access.load(Ordering::Relaxed))
                .map(|e| *e.key());
            let Some(oldest) = oldest else { break };
            self.entries.remove(&oldest);
            debug!(key = %oldest, "evicted least recently used program");
        }
    }

    /// Evict every program idle for longer than the TTL as of `now`.
    pub fn sweep(&self, now: Instant) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let now = self.millis(now);
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_sub(e.last_access.load(Ordering::Relaxed)) <= ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "swept idle programs");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Times the compile closure ran.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests;
