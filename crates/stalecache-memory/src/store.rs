//! Deadline-indexed two-level map shared by the driver and its collector.

use std::collections::HashMap;

use parking_lot::RwLock;
use stalecache_core::StoredValue;
use tokio::time::{Duration, Instant};

/// Horizon used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug)]
struct Item {
    value: Vec<u8>,
    deadline: Instant,
}

impl Item {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline <= now
    }
}

/// Location of an item, collected during the mark phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Path {
    cache: String,
    key: String,
}

impl Path {
    fn new(cache: &str, key: &str) -> Self {
        Self {
            cache: cache.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    items: RwLock<HashMap<String, HashMap<String, Item>>>,
}

impl Store {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a live item, removing it if its deadline has passed.
    pub(crate) fn get(&self, cache: &str, key: &str) -> Option<StoredValue> {
        let now = Instant::now();
        {
            let items = self.items.read();
            match items.get(cache).and_then(|keys| keys.get(key)) {
                None => return None,
                Some(item) if !item.is_expired(now) => {
                    return Some(StoredValue::new(
                        item.value.clone(),
                        item.deadline.duration_since(now),
                    ));
                },
                Some(_) => {},
            }
        }

        self.sweep(&[Path::new(cache, key)]);
        None
    }

    pub(crate) fn set(&self, cache: &str, key: &str, value: &[u8], ttl: Duration) {
        let now = Instant::now();
        let item = Item {
            value: value.to_vec(),
            deadline: now.checked_add(ttl).unwrap_or(now + FAR_FUTURE),
        };

        let mut items = self.items.write();
        items
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), item);
    }

    pub(crate) fn remove(&self, cache: &str, key: &str) {
        let mut items = self.items.write();
        if let Some(keys) = items.get_mut(cache) {
            keys.remove(key);
            if keys.is_empty() {
                items.remove(cache);
            }
        }
    }

    pub(crate) fn remove_all(&self, cache: &str) {
        self.items.write().remove(cache);
    }

    /// Collects the paths of every expired item under the shared lock.
    pub(crate) fn mark(&self) -> Vec<Path> {
        let now = Instant::now();
        let items = self.items.read();

        items
            .iter()
            .flat_map(|(cache, keys)| {
                keys.iter()
                    .filter(|(_, item)| item.is_expired(now))
                    .map(move |(key, _)| Path::new(cache, key))
            })
            .collect()
    }

    /// Deletes the given paths under the exclusive lock.
    ///
    /// Each deadline is checked again: an item refreshed after it was marked
    /// is kept.
    pub(crate) fn sweep(&self, paths: &[Path]) -> usize {
        if paths.is_empty() {
            return 0;
        }

        let now = Instant::now();
        let mut items = self.items.write();
        let mut swept = 0;

        for path in paths {
            if let Some(keys) = items.get_mut(&path.cache) {
                if keys.get(&path.key).is_some_and(|item| item.is_expired(now)) {
                    keys.remove(&path.key);
                    swept += 1;
                }
                if keys.is_empty() {
                    items.remove(&path.cache);
                }
            }
        }

        swept
    }

    /// Runs one mark and sweep cycle.
    pub(crate) fn collect(&self) -> usize {
        let marked = self.mark();
        self.sweep(&marked)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.read().values().map(HashMap::len).sum()
    }

    pub(crate) fn cache_len(&self, cache: &str) -> usize {
        self.items.read().get(cache).map_or(0, HashMap::len)
    }

    pub(crate) fn contains(&self, cache: &str, key: &str) -> bool {
        self.items
            .read()
            .get(cache)
            .is_some_and(|keys| keys.contains_key(key))
    }
}
