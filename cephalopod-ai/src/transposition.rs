//! 有界缓存
//!
//! 搜索使用的两类缓存：
//! - 置换缓存：记忆化 Alpha-Beta 的局面值，每次搜索开始时清空
//! - 模拟缓存：蒙特卡洛的模拟结果（蓝方视角的绝对值），跨搜索保留
//!
//! 容量满时整表清空（不是 LRU）。

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use cephalopod::{Move, StateKey};

/// 置换缓存默认容量
pub const DEFAULT_TRANSPOSITION_CAPACITY: usize = 200_000;

/// 模拟缓存默认容量
pub const DEFAULT_SIMULATION_CAPACITY: usize = 10_000;

/// 有界缓存
pub struct BoundedCache<K, V> {
    /// 条目
    map: HashMap<K, V>,
    /// 容量上限
    capacity: usize,
    /// 命中次数
    hits: AtomicU64,
    /// 查询次数
    lookups: AtomicU64,
    /// 因容量满而整表清空的次数
    evictions: u64,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// 创建指定容量的缓存（容量至少为 1）
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            evictions: 0,
        }
    }

    /// 查询条目
    pub fn get(&self, key: &K) -> Option<&V> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let entry = self.map.get(key);
        if entry.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        entry
    }

    /// 存储条目
    ///
    /// 新键会让条目数超过容量时，先整表清空再写入。
    pub fn insert(&mut self, key: K, value: V) {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            self.map.clear();
            self.evictions += 1;
        }
        self.map.insert(key, value);
    }

    /// 清空条目（统计信息保留）
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 容量上限
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity,
            used: self.map.len(),
            hits: self.hits.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            evictions: self.evictions,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    pub used: usize,
    pub hits: u64,
    pub lookups: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    pub fn usage(&self) -> f64 {
        self.used as f64 / self.capacity as f64
    }
}

/// 置换缓存：局面 -> (值, 最佳走法)
///
/// 键只含局面，不含搜索窗口和深度，见 [`CacheKeyPolicy::StateOnly`]。
pub type TranspositionCache = BoundedCache<StateKey, (f64, Option<Move>)>;

/// 模拟缓存：Zobrist 哈希 -> 模拟结果（蓝方视角）
pub type SimulationCache = BoundedCache<u64, f64>;

/// 置换缓存的键策略
///
/// 目前只有一种：键只含局面。某个窗口下得到的界值可能在另一个窗口下被当成
/// 精确值复用，截断搜索中不同深度的结果也会互相复用。这是已知的近似，保留不改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKeyPolicy {
    #[default]
    StateOnly,
}
