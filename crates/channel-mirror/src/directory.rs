//! 对端目录 - 名称 / 数字 id 到频道元数据的解析与缓存
//!
//! 每个未命中 key 恰好触发一次远端查询，结果在进程生命周期内
//! 缓存（显式 get-or-populate，见 `cache`）。解析结果不是频道
//! 时直接报错，不重试。

use std::sync::Arc;

use crate::cache::LazyCache;
use crate::error::{MirrorError, Result};
use crate::remote::DeltaSource;
use crate::types::{ChannelInfo, ResolvedPeer};

/// 名称/ id 解析服务
pub struct PeerDirectory {
    source: Arc<dyn DeltaSource>,
    resolve_cache: LazyCache<String, ResolvedPeer>,
    channel_cache: LazyCache<u64, ChannelInfo>,
}

impl PeerDirectory {
    pub fn new(source: Arc<dyn DeltaSource>) -> Self {
        Self {
            source,
            resolve_cache: LazyCache::new(),
            channel_cache: LazyCache::new(),
        }
    }

    /// 按用户名解析对端，整体缓存；附带缓存其中的频道元数据
    pub async fn resolve_by_name(&self, name: &str) -> Result<ResolvedPeer> {
        let source = &self.source;
        let peer = self
            .resolve_cache
            .get_or_populate(&name.to_string(), || async {
                source.resolve_username(name).await
            })
            .await?;
        if let Some(channel) = peer.first_channel() {
            self.channel_cache.insert(channel.id, channel.clone());
        }
        Ok(peer)
    }

    /// 按数字 id 查询频道元数据
    pub async fn resolve_by_id(&self, id: u64) -> Result<ChannelInfo> {
        let source = &self.source;
        self.channel_cache
            .get_or_populate(&id, || async move {
                let channels = source.get_channels(&[id]).await?;
                channels
                    .into_iter()
                    .find(|c| c.id == id)
                    .ok_or_else(|| MirrorError::NotFound("chat not found or not joined".into()))
            })
            .await
    }

    /// 名称或数字 id 的统一入口：全数字走 id 路径，否则按用户名
    pub async fn resolve_ref(&self, reference: &str) -> Result<ChannelInfo> {
        if let Some(id) = parse_numeric(reference) {
            self.resolve_by_id(id).await
        } else {
            let peer = self.resolve_by_name(reference).await?;
            peer.first_channel()
                .cloned()
                .ok_or_else(|| MirrorError::NotFound("chat not found or not joined".into()))
        }
    }

    /// 清空全部进程内缓存（随持久化 reset 一起调用）
    pub fn clear(&self) {
        self.resolve_cache.clear();
        self.channel_cache.clear();
    }
}

/// 非空纯数字字符串解析为 u64，否则 None
fn parse_numeric(s: &str) -> Option<u64> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SettingsStore;
    use crate::types::{ChannelDifference, ChannelRef, ChatInfo, PeerRecord};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingSource {
        resolve_calls: Mutex<usize>,
        lookup_calls: Mutex<usize>,
        channel_only_chat: bool,
    }

    fn channel_info(id: u64) -> ChannelInfo {
        ChannelInfo {
            id,
            access_hash: 11,
            title: format!("channel {}", id),
            username: None,
        }
    }

    #[async_trait]
    impl DeltaSource for CountingSource {
        async fn init(&self, _settings: &SettingsStore) -> Result<()> {
            Ok(())
        }
        async fn resolve_username(&self, name: &str) -> Result<ResolvedPeer> {
            *self.resolve_calls.lock() += 1;
            if name == "missing" {
                return Err(MirrorError::NotFound("no such peer".into()));
            }
            let chat = if self.channel_only_chat {
                PeerRecord::Chat(ChatInfo { id: 5, title: "plain chat".into() })
            } else {
                PeerRecord::Channel(channel_info(77))
            };
            Ok(ResolvedPeer { chats: vec![chat], users: vec![] })
        }
        async fn get_channels(&self, ids: &[u64]) -> Result<Vec<ChannelInfo>> {
            *self.lookup_calls.lock() += 1;
            Ok(ids.iter().filter(|&&id| id != 404).map(|&id| channel_info(id)).collect())
        }
        async fn channel_difference(
            &self,
            _channel: ChannelRef,
            _pts: u64,
        ) -> Result<ChannelDifference> {
            unreachable!("directory 不拉差异")
        }
        async fn remote_config(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    #[tokio::test]
    async fn name_resolution_is_cached_and_seeds_channel_cache() {
        let source = Arc::new(CountingSource::default());
        let directory = PeerDirectory::new(source.clone());

        directory.resolve_by_name("mirror").await.unwrap();
        directory.resolve_by_name("mirror").await.unwrap();
        assert_eq!(*source.resolve_calls.lock(), 1);

        // 解析时已缓存频道元数据，不触发 id 查询
        let info = directory.resolve_by_id(77).await.unwrap();
        assert_eq!(info.id, 77);
        assert_eq!(*source.lookup_calls.lock(), 0);
    }

    #[tokio::test]
    async fn id_resolution_is_cached() {
        let source = Arc::new(CountingSource::default());
        let directory = PeerDirectory::new(source.clone());

        directory.resolve_by_id(9).await.unwrap();
        directory.resolve_by_id(9).await.unwrap();
        assert_eq!(*source.lookup_calls.lock(), 1);
    }

    #[tokio::test]
    async fn missing_or_non_channel_peers_fail() {
        let source = Arc::new(CountingSource { channel_only_chat: true, ..Default::default() });
        let directory = PeerDirectory::new(source);

        let err = directory.resolve_ref("plainchat").await.unwrap_err();
        assert!(matches!(err, MirrorError::NotFound(_)));

        let err = directory.resolve_by_id(404).await.unwrap_err();
        assert!(matches!(err, MirrorError::NotFound(_)));
    }

    #[tokio::test]
    async fn ref_dispatches_on_all_digit_strings() {
        let source = Arc::new(CountingSource::default());
        let directory = PeerDirectory::new(source.clone());

        let info = directory.resolve_ref("12345").await.unwrap();
        assert_eq!(info.id, 12345);
        assert_eq!(*source.lookup_calls.lock(), 1);
        assert_eq!(*source.resolve_calls.lock(), 0);

        directory.resolve_ref("mirror").await.unwrap();
        assert_eq!(*source.resolve_calls.lock(), 1);
    }

    #[tokio::test]
    async fn clear_forces_fresh_lookup() {
        let source = Arc::new(CountingSource::default());
        let directory = PeerDirectory::new(source.clone());

        directory.resolve_by_id(9).await.unwrap();
        directory.clear();
        directory.resolve_by_id(9).await.unwrap();
        assert_eq!(*source.lookup_calls.lock(), 2);
    }
}
