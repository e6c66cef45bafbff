//! # 缓存模块
//!
//! 认证结果共享的内存过期缓存

pub mod expiring;

pub use expiring::{CacheStats, ExpiringCache, ExpiringCacheBuilder, ExpiryCallback};
