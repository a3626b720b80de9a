//! Block read cache.
//!
//! Caches fixed-size file blocks keyed by path, file length, modification time
//! and block index. Eviction is FIFO once `capacity_bytes` would be exceeded.

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::debug;

/// Identity of one cached block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    /// File path
    pub path: PathBuf,
    /// File length when the block was read
    pub file_len: u64,
    /// Modification time when the block was read
    pub modified: Option<SystemTime>,
    /// Zero-based block index
    pub index: u64,
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Blocks inserted
    pub insertions: u64,
    /// Blocks evicted
    pub evictions: u64,
    /// Bytes currently cached
    pub bytes_cached: u64,
    /// Blocks currently cached
    pub blocks_cached: u64,
    /// Cache hit ratio
    pub hit_ratio: f64,
}

#[derive(Debug, Default)]
struct CacheState {
    blocks: HashMap<BlockKey, Bytes>,
    order: VecDeque<BlockKey>,
    stats: CacheStats,
}

/// Bounded block cache shared by all scans of one engine
#[derive(Debug)]
pub struct BlockCache {
    capacity_bytes: u64,
    state: Mutex<CacheState>,
}

impl BlockCache {
    /// Cache holding at most `capacity_bytes`
    pub fn new(capacity_bytes: u64) -> Self {
        Self { capacity_bytes, state: Mutex::new(CacheState::default()) }
    }

    /// Look up a block, recording a hit or a miss
    pub fn get(&self, key: &BlockKey) -> Option<Bytes> {
        let mut state = self.state.lock();
        let found = state.blocks.get(key).cloned();

        let stats = &mut state.stats;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        stats.hit_ratio = stats.hits as f64 / (stats.hits + stats.misses) as f64;
        found
    }

    /// Insert a block, evicting the oldest blocks to make room.
    /// Blocks larger than the whole capacity are not cached.
    pub fn insert(&self, key: BlockKey, block: Bytes) {
        let size = block.len() as u64;
        if size > self.capacity_bytes {
            return;
        }

        let mut state = self.state.lock();
        if let Some(previous) = state.blocks.remove(&key) {
            state.order.retain(|k| k != &key);
            state.stats.bytes_cached -= previous.len() as u64;
        }

        while state.stats.bytes_cached + size > self.capacity_bytes {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if let Some(evicted) = state.blocks.remove(&oldest) {
                state.stats.bytes_cached -= evicted.len() as u64;
                state.stats.evictions += 1;
                debug!(path = %oldest.path.display(), index = oldest.index, "Evicted cached block");
            }
        }

        state.order.push_back(key.clone());
        state.blocks.insert(key, block);
        state.stats.insertions += 1;
        state.stats.bytes_cached += size;
        state.stats.blocks_cached = state.blocks.len() as u64;
    }

    /// Remove every block; counters other than the size are kept
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.blocks.clear();
        state.order.clear();
        state.stats.bytes_cached = 0;
        state.stats.blocks_cached = 0;
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.blocks_cached = state.blocks.len() as u64;
        stats
    }
}
