//! Per-directory trigger cache with TTL eviction
//!
//! Trigger files appear on disk asynchronously, so cached lists go stale.
//! Every event routed through a directory refreshes that entry's touch time;
//! entries idle past the cleanup interval are evicted on the next sweep,
//! forcing a reload from disk. Sweeps piggyback on the event path - there is
//! no background timer, so eviction granularity equals event arrival rate.

use super::loader::TriggerFileLoader;
use super::trigger::TriggerRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct CacheEntry {
    triggers: Vec<TriggerRecord>,
    last_touch: i64,
}

pub struct DirectoryTriggerCache {
    entries: HashMap<PathBuf, CacheEntry>,
    loader: TriggerFileLoader,
    cleanup_interval_secs: i64,

    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl DirectoryTriggerCache {
    pub fn new(loader: TriggerFileLoader, cleanup_interval_secs: i64) -> Self {
        Self::new_with_timestamp_fn(
            loader,
            cleanup_interval_secs,
            Box::new(|| chrono::Utc::now().timestamp()),
        )
    }

    pub fn new_with_timestamp_fn(
        loader: TriggerFileLoader,
        cleanup_interval_secs: i64,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            loader,
            cleanup_interval_secs,
            now_fn,
        }
    }

    /// Return the cached trigger list for `dir`, loading it on first access.
    ///
    /// An empty load result is cached like any other so a directory without
    /// trigger files is not re-scanned on every event.
    pub fn get_or_load(&mut self, dir: &Path) -> &[TriggerRecord] {
        let entry = self.entries.entry(dir.to_path_buf()).or_insert_with(|| {
            log::debug!("Loading triggers for dir {}", dir.display());
            CacheEntry {
                triggers: self.loader.load(dir),
                last_touch: (self.now_fn)(),
            }
        });
        &entry.triggers
    }

    /// Refresh the touch time of an existing entry. Called once per event
    /// routed through `dir`, whether or not anything matched.
    pub fn touch(&mut self, dir: &Path) {
        if let Some(entry) = self.entries.get_mut(dir) {
            entry.last_touch = (self.now_fn)();
        }
    }

    /// Evict every entry idle for at least the cleanup interval.
    pub fn sweep(&mut self) {
        let now = (self.now_fn)();
        let interval = self.cleanup_interval_secs;
        self.entries.retain(|dir, entry| {
            let keep = now - entry.last_touch < interval;
            if !keep {
                log::debug!("Evicting triggers for dir {}", dir.display());
            }
            keep
        });
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
