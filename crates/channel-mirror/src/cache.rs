//! 进程内只读穿透缓存 - get-or-populate
//!
//! 失效策略显式化：当前为"进程生命周期内永久有效"，调用点只依赖
//! get-or-populate 能力，未来换策略不必改调用方。

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::error::Result;

/// 无上限、不失效的懒填充缓存
#[derive(Debug)]
pub struct LazyCache<K, V> {
    map: Mutex<HashMap<K, V>>,
}

impl<K, V> LazyCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.lock().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.map.lock().insert(key, value);
    }

    /// 命中直接返回；未命中执行一次 `populate` 并写入
    ///
    /// 填充期间不持锁（populate 是异步远端调用）。调用方运行在
    /// 单串行化请求流中，同 key 不会并发填充。
    pub async fn get_or_populate<F, Fut>(&self, key: &K, populate: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = populate().await?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        self.map.lock().clear();
    }
}

impl<K, V> Default for LazyCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn populates_once_then_hits() {
        let cache: LazyCache<String, u64> = LazyCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_populate(&"k".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42u64)
                })
                .await
                .unwrap();
            assert_eq!(v, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache: LazyCache<String, u64> = LazyCache::new();
        let calls = AtomicUsize::new(0);

        let err = cache
            .get_or_populate(&"k".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(crate::error::MirrorError::NotFound("k".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::MirrorError::NotFound(_)));

        let v = cache
            .get_or_populate(&"k".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7u64)
            })
            .await
            .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let cache: LazyCache<u64, u64> = LazyCache::new();
        cache.insert(1, 10);
        assert_eq!(cache.get(&1), Some(10));
        cache.clear();
        assert_eq!(cache.get(&1), None);
    }
}
