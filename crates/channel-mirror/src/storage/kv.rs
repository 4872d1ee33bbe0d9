//! KV 存储模块 - 基于 sled 的有序键值存储
//!
//! 键按字节字典序排列，配合 `storage::keys` 的保序编码即可用
//! 范围扫描实现按消息 id 的升/降序读取。所有值序列化为 JSON。

use serde::{Deserialize, Serialize};
use sled::Tree;

use crate::error::{MirrorError, Result};

/// 有序 KV 存储组件
///
/// put/delete 为单键原子操作；不主动 flush，崩溃丢失的写入由
/// 上层的幂等重放语义兜底（见 sync::applier）。
#[derive(Debug, Clone)]
pub struct KvStore {
    tree: Tree,
}

impl KvStore {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    /// 设置键值对
    pub async fn set<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: Serialize,
    {
        let value_bytes = serde_json::to_vec(value)
            .map_err(|e| MirrorError::Serialization(format!("序列化值失败: {}", e)))?;

        self.tree
            .insert(key, value_bytes)
            .map_err(|e| MirrorError::KvStore(format!("设置键值对失败: {}", e)))?;

        Ok(())
    }

    /// 获取键值对
    pub async fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: for<'de> Deserialize<'de>,
    {
        let result = self
            .tree
            .get(key)
            .map_err(|e| MirrorError::KvStore(format!("获取键值对失败: {}", e)))?;

        match result {
            Some(value_bytes) => {
                let value = serde_json::from_slice(&value_bytes)
                    .map_err(|e| MirrorError::Serialization(format!("反序列化值失败: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// 删除键值对
    pub async fn delete<K>(&self, key: K) -> Result<()>
    where
        K: AsRef<[u8]>,
    {
        self.tree
            .remove(key)
            .map_err(|e| MirrorError::KvStore(format!("删除键值对失败: {}", e)))?;

        Ok(())
    }

    /// 检查键是否存在
    pub async fn exists<K>(&self, key: K) -> Result<bool>
    where
        K: AsRef<[u8]>,
    {
        self.tree
            .contains_key(key)
            .map_err(|e| MirrorError::KvStore(format!("检查键存在失败: {}", e)))
    }

    /// 获取指定前缀的所有键值对（升序）
    pub async fn scan_prefix<V>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: for<'de> Deserialize<'de>,
    {
        let mut results = Vec::new();

        for result in self.tree.scan_prefix(prefix) {
            let (key, value_bytes) =
                result.map_err(|e| MirrorError::KvStore(format!("扫描前缀失败: {}", e)))?;

            let value = serde_json::from_slice(&value_bytes)
                .map_err(|e| MirrorError::Serialization(format!("反序列化值失败: {}", e)))?;

            results.push((key.to_vec(), value));
        }

        Ok(results)
    }

    /// 逆序范围扫描：`[start, end)` 内按键降序取至多 `limit` 条值
    pub async fn scan_range_rev<V>(&self, start: &str, end: &str, limit: usize) -> Result<Vec<V>>
    where
        V: for<'de> Deserialize<'de>,
    {
        let mut results = Vec::with_capacity(limit.min(128));

        for result in self
            .tree
            .range(start.as_bytes()..end.as_bytes())
            .rev()
            .take(limit)
        {
            let (_key, value_bytes) =
                result.map_err(|e| MirrorError::KvStore(format!("范围扫描失败: {}", e)))?;

            let value = serde_json::from_slice(&value_bytes)
                .map_err(|e| MirrorError::Serialization(format!("反序列化值失败: {}", e)))?;

            results.push(value);
        }

        Ok(results)
    }

    /// 清空整棵树
    pub async fn clear(&self) -> Result<()> {
        self.tree
            .clear()
            .map_err(|e| MirrorError::KvStore(format!("清空存储失败: {}", e)))?;
        Ok(())
    }
}
