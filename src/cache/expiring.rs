//! # 过期缓存
//!
//! 固定 TTL 的并发键值缓存。过期条目在访问时惰性淘汰，也可以由后台清理任务
//! 定期淘汰；任何过期条目都不会被当作有效值返回。

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Callback invoked once for every entry that is evicted because it expired.
pub type ExpiryCallback<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Expired strictly after `created_at + ttl`.
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// 当前条目数（含尚未清理的过期条目）
    pub total_keys: usize,
    /// 命中次数
    pub hit_count: u64,
    /// 未命中次数
    pub miss_count: u64,
    /// 已过期并被移除的条目数
    pub expired_count: u64,
}

impl CacheStats {
    /// 命中率，无访问时为 0
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Builder for [`ExpiringCache`].
pub struct ExpiringCacheBuilder<K, V> {
    ttl: Duration,
    max_entries: usize,
    on_expired: Option<ExpiryCallback<K, V>>,
}

impl<K, V> ExpiringCacheBuilder<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Upper bound on stored entries; `0` means unbounded.
    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Register the expiry callback.
    #[must_use]
    pub fn on_expired<F>(mut self, callback: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_expired = Some(Arc::new(callback));
        self
    }

    /// 构建缓存
    #[must_use]
    pub fn build(self) -> ExpiringCache<K, V> {
        ExpiringCache {
            entries: DashMap::new(),
            ttl: self.ttl,
            max_entries: self.max_entries,
            on_expired: self.on_expired,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }
}

/// 固定 TTL 的内存缓存
///
/// The TTL is a single duration for the whole cache. `put` always stamps a
/// fresh creation time, so overwriting a key restarts its window.
pub struct ExpiringCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    on_expired: Option<ExpiryCallback<K, V>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    expired_count: AtomicU64,
}

impl<K: Eq + Hash, V> fmt::Debug for ExpiringCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

enum Lookup {
    Missing,
    Expired,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Unbounded cache with the given TTL and no expiry callback.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::builder(ttl).build()
    }

    /// Start a builder for callbacks and a size bound.
    #[must_use]
    pub const fn builder(ttl: Duration) -> ExpiringCacheBuilder<K, V> {
        ExpiringCacheBuilder {
            ttl,
            max_entries: 0,
            on_expired: None,
        }
    }

    /// 条目存活时间
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 设置缓存值，覆盖同键的旧条目
    pub fn put(&self, key: K, value: V) {
        if self.max_entries > 0
            && self.entries.len() >= self.max_entries
            && !self.entries.contains_key(&key)
        {
            self.evict_oldest();
        }
        self.entries.insert(key, CacheEntry::new(value));
    }

    /// 获取未过期的缓存值
    ///
    /// An expired entry is removed and reported to the expiry callback before
    /// this returns `None`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let lookup = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl, now) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        };

        if matches!(lookup, Lookup::Expired) {
            self.evict_if_expired(key, now);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// 删除缓存值
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Evict every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(self.ttl, now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter(|key| self.evict_if_expired(*key, now))
            .count()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空所有缓存，不触发过期回调
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 统计信息快照
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_keys: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            expired_count: self.expired_count.load(Ordering::Relaxed),
        }
    }

    // remove_if re-checks expiry under the shard lock, so a concurrent fresh
    // put survives and only one caller ever wins the removal.
    fn evict_if_expired<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let ttl = self.ttl;
        let Some((key, entry)) = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(ttl, now))
        else {
            return false;
        };

        self.expired_count.fetch_add(1, Ordering::Relaxed);
        if let Some(callback) = &self.on_expired {
            callback(&key, &entry.value);
        }
        true
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// 启动后台过期清理任务
    ///
    /// The task holds a weak reference and stops on its own once the cache is
    /// dropped; abort the handle to stop it earlier.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // 第一次 tick 立即完成
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = cache.len(), "swept expired cache entries");
                }
            }
        })
    }
}
