//! 设置命名空间 - 远端会话等不透明 JSON 块的持久化
//!
//! 与消息/pts 写入不同，这里的写入是 fire-and-forget：不保证落盘，
//! 失败只记日志。会话状态可在下次初始化时重建，丢失不影响正确性。

use serde::{Deserialize, Serialize};
use sled::Tree;
use tracing::warn;

use crate::error::{MirrorError, Result};

const PREFIX: &str = "settings:";

/// 按存储类别（caller 提供的字符串描述符）读写 JSON 块
#[derive(Debug, Clone)]
pub struct SettingsStore {
    tree: Tree,
}

impl SettingsStore {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    fn key(kind: &str) -> String {
        format!("{}{}", PREFIX, kind)
    }

    /// 读取一个设置块
    pub async fn load<V>(&self, kind: &str) -> Result<Option<V>>
    where
        V: for<'de> Deserialize<'de>,
    {
        let result = self
            .tree
            .get(Self::key(kind))
            .map_err(|e| MirrorError::KvStore(format!("读取设置失败: {}", e)))?;

        match result {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| MirrorError::Serialization(format!("反序列化设置失败: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// 写入一个设置块，fire-and-forget：错误记日志后吞掉
    pub async fn store<V>(&self, kind: &str, value: &V)
    where
        V: Serialize,
    {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("设置序列化失败，丢弃写入: kind={} err={}", kind, e);
                return;
            }
        };
        if let Err(e) = self.tree.insert(Self::key(kind), bytes) {
            warn!("设置写入失败，丢弃: kind={} err={}", kind, e);
        }
    }

    /// 删除一个设置块，同样 fire-and-forget
    pub async fn remove(&self, kind: &str) {
        if let Err(e) = self.tree.remove(Self::key(kind)) {
            warn!("设置删除失败: kind={} err={}", kind, e);
        }
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.tree
            .clear()
            .map_err(|e| MirrorError::KvStore(format!("清空设置失败: {}", e)))?;
        Ok(())
    }
}
