//! 镜像服务门面 - 初始化 / 请求串行化 / 编排
//!
//! 并发模型：单个 `tokio::sync::Mutex` 闸门把所有会触碰状态的
//! 请求体串行成一条流（每逻辑频道可在该流内交错，但请求体之间
//! 不并发）。初始化是三态共享记忆化操作，见 `init`。

use std::sync::Arc;

use tracing::info;

use crate::directory::PeerDirectory;
use crate::error::Result;
use crate::init::SharedInit;
use crate::remote::DeltaSource;
use crate::storage::StorageManager;
use crate::sync::SyncEngine;
use crate::types::{Message, ResolvedPeer};

/// 频道镜像服务
pub struct MirrorService {
    source: Arc<dyn DeltaSource>,
    storage: StorageManager,
    directory: PeerDirectory,
    engine: SyncEngine,
    init: SharedInit,
    gate: tokio::sync::Mutex<()>,
}

impl MirrorService {
    pub fn new(source: Arc<dyn DeltaSource>, storage: StorageManager) -> Self {
        let engine = SyncEngine::new(storage.kv().clone());
        let directory = PeerDirectory::new(source.clone());
        Self {
            source,
            storage,
            directory,
            engine,
            init: SharedInit::new(),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// 确保远端会话已建立（至多成功一次，失败可重试）
    pub async fn ensure_init(&self) -> Result<()> {
        let source = self.source.clone();
        let settings = self.storage.settings().clone();
        self.init
            .ensure(move || async move { source.init(&settings).await })
            .await
    }

    /// 同步后分页读取频道消息
    ///
    /// `reference` 为频道用户名或纯数字 id。调用方须已完成
    /// cursor/limit 校验（HTTP 层在任何远端/存储调用前做）。
    pub async fn channel_messages(
        &self,
        reference: &str,
        cursor: u64,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let _guard = self.gate.lock().await;
        let channel = self.directory.resolve_ref(reference).await?;
        self.engine
            .sync_and_read(self.source.as_ref(), channel.to_ref(), cursor, limit)
            .await
    }

    /// 按用户名解析对端（诊断用，结果整体返回）
    pub async fn resolve(&self, name: &str) -> Result<ResolvedPeer> {
        let _guard = self.gate.lock().await;
        self.directory.resolve_by_name(name).await
    }

    /// 远端配置快照
    pub async fn remote_config(&self) -> Result<serde_json::Value> {
        self.source.remote_config().await
    }

    /// 清空全部本地状态：持久化树与进程内缓存一并清掉
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.gate.lock().await;
        self.storage.reset().await?;
        self.directory.clear();
        info!("镜像状态已重置");
        Ok(())
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }
}
