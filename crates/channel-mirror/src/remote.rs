//! 远端差异源契约 - 会话建立 / 名称解析 / 差异拉取
//!
//! 本 crate 不实现远端协议本身（会话握手、加密传输、RPC 帧），
//! 只定义引擎消费的接口。实现方可在 `init` 中使用
//! [`SettingsStore`] 持久化会话状态。

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::settings::SettingsStore;
use crate::types::{ChannelDifference, ChannelInfo, ChannelRef, ResolvedPeer};

/// 协议允许的最小 pts，"从未同步" 时以它发起首次差异请求
pub const MIN_PTS: u64 = 1;

/// 远端差异源
///
/// 所有方法都是一次性的：失败直接向调用方传播，不在此层重试。
#[async_trait]
pub trait DeltaSource: Send + Sync {
    /// 建立远端会话，进程生命周期内至多成功一次
    async fn init(&self, settings: &SettingsStore) -> Result<()>;

    /// 按用户名解析对端
    async fn resolve_username(&self, name: &str) -> Result<ResolvedPeer>;

    /// 按数字 id 批量查询频道元数据
    async fn get_channels(&self, ids: &[u64]) -> Result<Vec<ChannelInfo>>;

    /// 拉取自 `pts` 以来的频道差异
    async fn channel_difference(&self, channel: ChannelRef, pts: u64) -> Result<ChannelDifference>;

    /// 远端配置快照（诊断用）
    async fn remote_config(&self) -> Result<serde_json::Value>;
}
