//! 进度游标存储 - 每频道一个单调不减的 pts
//!
//! key 格式：`channel:<id16>:pts`。差异请求必须使用最后一次
//! *已持久化* 的游标，崩溃后重试才能重新拉到同一段差异。

use std::sync::Arc;

use crate::error::Result;
use crate::remote::MIN_PTS;
use crate::storage::{keys, KvStore};

/// 存储每个频道的同步进度
#[derive(Debug, Clone)]
pub struct PtsStore {
    kv: Arc<KvStore>,
}

impl PtsStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    /// 读取已持久化的 pts；缺失返回 None
    pub async fn get(&self, channel_id: u64) -> Result<Option<u64>> {
        self.kv.get(keys::channel_pts(channel_id)).await
    }

    /// 读取 pts，缺失回退到协议最小值（"从未同步"）
    pub async fn get_or_min(&self, channel_id: u64) -> Result<u64> {
        Ok(self.get(channel_id).await?.unwrap_or(MIN_PTS))
    }

    /// 持久化新 pts（差异应用的最后一步）
    pub async fn set(&self, channel_id: u64, pts: u64) -> Result<()> {
        self.kv.set(keys::channel_pts(channel_id), &pts).await
    }
}
