//! The bounded cache backing `LayoutTree::compute_incremental`, plus the
//! two `DispatchCache` adapters installed around a pass: one gated by the
//! dirty/children-dirty flags the tree maintains, one that bypasses reads
//! entirely for `compute_full`'s audit path (§6, §9).

use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::dispatcher::{ConstraintKey, DependencyKind, DispatchCache};
use crate::layout::Layout;

/// Default capacity for the LRU store backing one `LayoutTree`. Generous
/// enough that a single incremental pass over a few thousand nodes doesn't
/// evict entries it will need again before the next mutation.
const DEFAULT_CAPACITY: usize = 4096;

#[derive(Clone)]
struct Entry {
    key: ConstraintKey,
    layout: Layout,
    dep: DependencyKind,
}

/// Hit/miss counters exposed to callers via `LayoutTree::cache_stats`.
/// Cumulative across the tree's lifetime; reset only by `clear_cache`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One `ConstraintKey`-indexed cache entry per `uid`. A node only ever has
/// one live entry at a time — the last constraint it was laid out under —
/// since a real layout tree re-derives a node's constraints deterministically
/// from its position in the tree, not from a history of past calls.
pub struct ConstraintCache {
    entries: std::collections::HashMap<u64, Entry>,
    lru: LruCache<u64, ()>,
    stats: CacheStats,
}

impl ConstraintCache {
    pub fn new() -> Self {
        ConstraintCache {
            entries: std::collections::HashMap::new(),
            lru: LruCache::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap()),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats = CacheStats::default();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn remove(&mut self, uid: u64) {
        self.entries.remove(&uid);
        self.lru.pop(&uid);
    }

    /// Every uid with a live cache entry whose `DependencyKind` is affected
    /// by a viewport resize along the changed axes. `Static` entries never
    /// appear here, per the selective-invalidation contract (§6).
    pub fn dependent_uids(&self, width_changed: bool, height_changed: bool) -> Vec<u64> {
        self.entries
            .iter()
            .filter_map(|(uid, entry)| {
                let affected = match entry.dep {
                    DependencyKind::Static => false,
                    DependencyKind::Viewport => true,
                    DependencyKind::ParentWidth => width_changed,
                    DependencyKind::ParentHeight => height_changed,
                    DependencyKind::ParentBoth => width_changed || height_changed,
                    DependencyKind::Intrinsic => width_changed,
                };
                affected.then_some(*uid)
            })
            .collect()
    }

    fn get_raw(&mut self, uid: u64, key: &ConstraintKey) -> Option<Layout> {
        let hit = match self.entries.get(&uid) {
            Some(entry) => entry.key.is_equivalent_for(key, false, false),
            None => false,
        };
        if !hit {
            return None;
        }
        self.lru.get(&uid);
        self.entries.get(&uid).map(|e| e.layout.clone())
    }

    fn put_raw(&mut self, uid: u64, key: ConstraintKey, layout: Layout, dep: DependencyKind) {
        if self.lru.len() >= self.lru.cap().get() && !self.lru.contains(&uid) {
            if let Some((evicted, _)) = self.lru.pop_lru() {
                self.entries.remove(&evicted);
            }
        }
        self.lru.put(uid, ());
        self.entries.insert(uid, Entry { key, layout, dep });
    }
}

/// `DispatchCache` installed during `compute_incremental`: a node's cache
/// entry is only consulted when neither it nor any descendant is marked
/// dirty. Every node has its own style telling the real equivalence check
/// (`ConstraintKey::is_equivalent_for`) which axes are style-fixed, but that
/// information isn't available here, so this adapter falls back to the
/// coarser quantized-key match — the dirty gating is what actually does the
/// invalidation work; constraint-key equivalence only prevents *unnecessary*
/// recomputation within a call when the same node is asked for twice with
/// the same constraints.
pub struct CacheAdapter<'a> {
    pub cache: &'a mut ConstraintCache,
    pub dirty: &'a HashSet<u64>,
    pub children_dirty: &'a HashSet<u64>,
}

impl<'a> DispatchCache for CacheAdapter<'a> {
    fn get(&mut self, uid: u64, key: &ConstraintKey) -> Option<Layout> {
        if self.dirty.contains(&uid) || self.children_dirty.contains(&uid) {
            log::debug!("cache: miss for uid={} (dirty)", uid);
            self.cache.stats.misses += 1;
            return None;
        }
        match self.cache.get_raw(uid, key) {
            Some(layout) => {
                self.cache.stats.hits += 1;
                Some(layout)
            }
            None => {
                log::debug!("cache: miss for uid={} (no equivalent entry)", uid);
                self.cache.stats.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, uid: u64, key: ConstraintKey, layout: Layout, dep: DependencyKind) {
        self.cache.put_raw(uid, key, layout, dep);
    }
}

/// `DispatchCache` installed during `compute_full`: every read misses, but
/// writes still land in the real cache so a subsequent `compute_incremental`
/// benefits from the audit pass instead of having to redo it.
pub struct WriteThroughCache<'a> {
    pub inner: &'a mut ConstraintCache,
}

impl<'a> DispatchCache for WriteThroughCache<'a> {
    fn get(&mut self, _uid: u64, _key: &ConstraintKey) -> Option<Layout> {
        None
    }

    fn put(&mut self, uid: u64, key: ConstraintKey, layout: Layout, dep: DependencyKind) {
        self.inner.put_raw(uid, key, layout, dep);
    }
}
