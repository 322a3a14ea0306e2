//! TtlCache - 期限付きの key→value ストア
//!
//! # 振る舞い
//! - `get` は read → 期限チェック → 期限切れなら削除、を一つのロック内で行う
//! - 能動的な掃除スレッドはない（期限切れエントリは同じ key が読まれるまで残る）
//! - 上限サイズも LRU もない。key 空間は endpoint の入力で決まるので許容する

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::ports::{Clock, SystemClock};

struct CacheEntry<V> {
    value: V,
    /// `None` means the TTL was too large to represent and the entry never expires.
    expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Expiring cache with one mutual-exclusion domain per instance.
pub struct TtlCache<V> {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    /// Value stored under `key` if it has not expired yet.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let expires_at = self.clock.now().checked_add_signed(self.ttl);
        self.lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // 値の clone 中に panic しても map 自体は壊れないので poison は無視する
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
