//! 频道同步引擎 - sync-then-read 统一入口
//!
//! 每次读取前先把镜像推进到远端当前状态：读已持久化 pts →
//! 拉差异 → 应用 → 按游标分页读取。没有后台同步循环，新鲜度
//! 由请求频率决定。
//!
//! ## NOTE: Engine 不做重试
//!
//! 所有失败直接向调用方传播。崩溃/重试的正确性由 applier 的
//! 幂等语义保证，不在引擎层补偿。

use std::sync::Arc;

use tracing::debug;

use crate::error::{MirrorError, Result};
use crate::remote::DeltaSource;
use crate::storage::{keys, KvStore};
use crate::types::{ChannelDifference, ChannelRef, Message};
use super::applier;
use super::cursor_store::PtsStore;

/// 分页 limit 的闭区间边界
pub const LIMIT_MIN: usize = 1;
pub const LIMIT_MAX: usize = 100;

/// 频道同步引擎
pub struct SyncEngine {
    kv: Arc<KvStore>,
    pts_store: PtsStore,
}

impl SyncEngine {
    pub fn new(kv: Arc<KvStore>) -> Self {
        let pts_store = PtsStore::new(kv.clone());
        Self { kv, pts_store }
    }

    /// 同步后分页读取
    ///
    /// `cursor == 0` 表示"从最新消息开始"；其余取值返回 id 严格
    /// 小于 cursor 的消息。结果按 id 降序，至多 `limit` 条。
    pub async fn sync_and_read(
        &self,
        source: &dyn DeltaSource,
        channel: ChannelRef,
        cursor: u64,
        limit: usize,
    ) -> Result<Vec<Message>> {
        validate_cursor(cursor)?;
        validate_limit(limit)?;

        self.sync(source, channel).await?;
        self.read_page(channel.id, cursor, limit).await
    }

    /// 以最后一次已持久化的 pts 拉取并应用一段差异
    pub async fn sync(&self, source: &dyn DeltaSource, channel: ChannelRef) -> Result<()> {
        let pts = self.pts_store.get_or_min(channel.id).await?;
        debug!("开始同步: channel={} pts={}", channel.id, pts);

        match source.channel_difference(channel, pts).await? {
            ChannelDifference::Delta(delta) => {
                applier::apply_difference(&self.kv, channel.id, &delta).await?;
                Ok(())
            }
            // 当前设计不做历史重建，显式失败而不是静默返回残缺数据
            ChannelDifference::TooLong { .. } => Err(MirrorError::DifferenceTooLong),
        }
    }

    /// 从本地镜像读一页消息（降序，游标为严格上界）
    pub async fn read_page(&self, channel_id: u64, cursor: u64, limit: usize) -> Result<Vec<Message>> {
        let bound = if cursor == 0 { keys::NARROW_MAX } else { cursor };
        let prefix = keys::channel_message_prefix(channel_id);
        let end = keys::channel_message(channel_id, bound);
        self.kv.scan_range_rev(&prefix, &end, limit).await
    }

    pub fn pts_store(&self) -> &PtsStore {
        &self.pts_store
    }
}

/// 校验分页游标：须落在窄段可表示范围内
pub fn validate_cursor(cursor: u64) -> Result<()> {
    if cursor > keys::NARROW_MAX {
        return Err(MirrorError::InvalidArgument(format!(
            "cursor out of range: {}",
            cursor
        )));
    }
    Ok(())
}

/// 校验分页大小：闭区间 [1, 100]
pub fn validate_limit(limit: usize) -> Result<()> {
    if !(LIMIT_MIN..=LIMIT_MAX).contains(&limit) {
        return Err(MirrorError::InvalidArgument(format!(
            "limit out of range: {}",
            limit
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundedDelta, NewMessage};
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    fn message(id: u64) -> Message {
        Message {
            id,
            date: Utc::now(),
            from_id: None,
            text: format!("m{}", id),
            pinned: false,
        }
    }

    /// 回放固定差异序列的测试源：每个 pts 只认一次请求起点
    struct ScriptedSource {
        calls: Mutex<Vec<u64>>,
        response: Mutex<Option<ChannelDifference>>,
    }

    impl ScriptedSource {
        fn with_delta(delta: BoundedDelta) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                response: Mutex::new(Some(ChannelDifference::Delta(delta))),
            }
        }

        fn empty(pts: u64) -> BoundedDelta {
            BoundedDelta {
                new_messages: vec![],
                chats: vec![],
                users: vec![],
                other_updates: vec![],
                pts,
            }
        }
    }

    #[async_trait]
    impl DeltaSource for ScriptedSource {
        async fn init(&self, _settings: &crate::storage::SettingsStore) -> Result<()> {
            Ok(())
        }
        async fn resolve_username(&self, name: &str) -> Result<crate::types::ResolvedPeer> {
            Err(MirrorError::NotFound(name.to_string()))
        }
        async fn get_channels(&self, _ids: &[u64]) -> Result<Vec<crate::types::ChannelInfo>> {
            Ok(vec![])
        }
        async fn channel_difference(
            &self,
            _channel: ChannelRef,
            pts: u64,
        ) -> Result<ChannelDifference> {
            self.calls.lock().push(pts);
            Ok(self
                .response
                .lock()
                .take()
                .unwrap_or(ChannelDifference::Delta(Self::empty(pts))))
        }
        async fn remote_config(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    fn open_engine(dir: &TempDir) -> SyncEngine {
        let db = sled::open(dir.path().join("kv")).unwrap();
        SyncEngine::new(Arc::new(KvStore::new(db.open_tree("mirror").unwrap())))
    }

    const CHAN: ChannelRef = ChannelRef { id: 123, access_hash: 7 };

    #[tokio::test]
    async fn first_sync_requests_min_pts_then_persisted_pts() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        let mut delta = ScriptedSource::empty(90);
        delta.new_messages = vec![NewMessage::Message(message(1))];
        let source = ScriptedSource::with_delta(delta);

        engine.sync(&source, CHAN).await.unwrap();
        engine.sync(&source, CHAN).await.unwrap();

        // 第一次用协议最小值 1，第二次用已持久化的 90
        assert_eq!(*source.calls.lock(), vec![1, 90]);
    }

    #[tokio::test]
    async fn paginates_newest_first_with_strict_upper_bound() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        let mut delta = ScriptedSource::empty(50);
        delta.new_messages = vec![
            NewMessage::Message(message(10)),
            NewMessage::Message(message(9)),
            NewMessage::Message(message(8)),
        ];
        let source = ScriptedSource::with_delta(delta);

        let page = engine.sync_and_read(&source, CHAN, 0, 2).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![10, 9]);

        let page = engine.sync_and_read(&source, CHAN, 9, 2).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![8]);
    }

    #[tokio::test]
    async fn difference_too_long_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        let source = ScriptedSource {
            calls: Mutex::new(vec![]),
            response: Mutex::new(Some(ChannelDifference::TooLong { pts: 500 })),
        };

        let err = engine.sync(&source, CHAN).await.unwrap_err();
        assert!(matches!(err, MirrorError::DifferenceTooLong));
        // 本地 pts 保持不变
        assert_eq!(engine.pts_store().get(CHAN.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_invalid_cursor_and_limit_before_any_call() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        let source = ScriptedSource::with_delta(ScriptedSource::empty(1));

        for (cursor, limit) in [(0u64, 0usize), (0, 101), (keys::NARROW_MAX + 1, 10)] {
            let err = engine
                .sync_and_read(&source, CHAN, cursor, limit)
                .await
                .unwrap_err();
            assert!(matches!(err, MirrorError::InvalidArgument(_)));
        }
        assert!(source.calls.lock().is_empty());
    }
}
