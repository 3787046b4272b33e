//! Bounded least-recently-used cache of heuristic scores.
//!
//! Shared across requests and worker threads. The cache only ever stores
//! what `heuristic::score` returned for the same key, so a hit and a miss
//! yield the same value; ranking never depends on whether it is present.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::board::player::Player;
use crate::board::state::{BoardState, Layout};
use crate::eval::heuristic;

/// Cache key: checker layout plus the side the score is for.
pub type CacheKey = (Layout, Player);

/// Entries and recency order, kept under one lock.
struct LruInner {
    /// Key to (score, last-use tick).
    map: HashMap<CacheKey, (f64, u64)>,
    /// Last-use tick to key; the first entry is the least recently used.
    order: BTreeMap<u64, CacheKey>,
    tick: u64,
}

impl LruInner {
    fn touch(&mut self, key: &CacheKey) -> Option<f64> {
        let tick = self.tick;
        let (value, last) = self.map.get_mut(key)?;
        self.order.remove(last);
        *last = tick;
        let value = *value;
        self.order.insert(tick, *key);
        self.tick += 1;
        Some(value)
    }
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU cache of heuristic scores, bounded by entry count.
pub struct HeuristicCache {
    inner: Mutex<LruInner>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HeuristicCache {
    /// Creates a cache holding at most `capacity` entries. A capacity of
    /// zero stores nothing.
    pub fn new(capacity: usize) -> Self {
        HeuristicCache {
            inner: Mutex::new(LruInner {
                map: HashMap::with_capacity(capacity.min(1 << 16)),
                order: BTreeMap::new(),
                tick: 0,
            }),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a score and marks it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<f64> {
        let mut inner = self.inner.lock().ok()?;
        inner.touch(key)
    }

    /// Stores a score, evicting the least recently used entry when full.
    pub fn insert(&self, key: CacheKey, value: f64) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.touch(&key).is_some() {
            return;
        }
        while inner.map.len() >= self.capacity {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            inner.map.remove(&oldest);
        }
        let tick = inner.tick;
        inner.tick += 1;
        inner.map.insert(key, (value, tick));
        inner.order.insert(tick, key);
    }

    /// Returns the heuristic score for `perspective`, computing and storing
    /// it on a miss.
    pub fn score(&self, state: &BoardState, perspective: Player) -> f64 {
        let key = (state.layout(), perspective);
        if let Some(v) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return v;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let v = heuristic::score(state, perspective);
        self.insert(key, v);
        v
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Removes every entry and resets the counters.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.map.clear();
            inner.order.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Scores with an optional cache in front of the evaluator.
#[inline]
pub fn cached_score(cache: Option<&HeuristicCache>, state: &BoardState, perspective: Player) -> f64 {
    match cache {
        Some(c) => c.score(state, perspective),
        None => heuristic::score(state, perspective),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key_for(points: u8) -> CacheKey {
        let mut state = BoardState::empty(Player::One);
        state.place(Player::One, points, 1);
        (state.layout(), Player::One)
    }

    #[test]
    fn hit_equals_miss() {
        let cache = HeuristicCache::new(16);
        let state = BoardState::starting(Player::One);
        let miss = cache.score(&state, Player::Two);
        let hit = cache.score(&state, Player::Two);
        assert_eq!(miss.to_bits(), hit.to_bits());
        assert_eq!(miss.to_bits(), heuristic::score(&state, Player::Two).to_bits());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = HeuristicCache::new(2);
        cache.insert(key_for(1), 1.0);
        cache.insert(key_for(2), 2.0);
        // Touch 1 so that 2 becomes the oldest.
        assert_eq!(cache.get(&key_for(1)), Some(1.0));
        cache.insert(key_for(3), 3.0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key_for(2)), None);
        assert_eq!(cache.get(&key_for(1)), Some(1.0));
        assert_eq!(cache.get(&key_for(3)), Some(3.0));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = HeuristicCache::new(0);
        cache.insert(key_for(1), 1.0);
        assert!(cache.is_empty());
        let state = BoardState::starting(Player::One);
        assert_eq!(
            cache.score(&state, Player::One).to_bits(),
            heuristic::score(&state, Player::One).to_bits()
        );
    }

    #[test]
    fn perspective_is_part_of_key() {
        let cache = HeuristicCache::new(8);
        let mut state = BoardState::starting(Player::One);
        state.apply_submove(Player::One, crate::board::moves::SubMove::new(24, 18));
        let one = cache.score(&state, Player::One);
        let two = cache.score(&state, Player::Two);
        assert_ne!(one.to_bits(), two.to_bits());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_access_stays_bounded() {
        let cache = Arc::new(HeuristicCache::new(8));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 1..=24u8 {
                        cache.insert(key_for(i), (i as f64) + t as f64);
                        let _ = cache.get(&key_for(i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 8);
    }

    #[test]
    fn clear_resets() {
        let cache = HeuristicCache::new(4);
        let state = BoardState::starting(Player::One);
        cache.score(&state, Player::One);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }
}
