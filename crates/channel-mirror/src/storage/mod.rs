//! 存储模块 - 镜像数据的持久化层
//!
//! 分两个命名空间（sled tree）：
//! - `mirror`: 频道 / 消息 / 对端记录 / pinned 集合 / pts，key 布局见 `keys`
//! - `settings`: 不透明设置块（如远端会话状态），fire-and-forget 写入

use std::path::Path;
use std::sync::Arc;

use crate::error::{MirrorError, Result};

pub mod keys;
pub mod kv;
pub mod settings;

pub use kv::KvStore;
pub use settings::SettingsStore;

const MIRROR_TREE: &str = "mirror";
const SETTINGS_TREE: &str = "settings";

/// 存储管理器 - 持有数据库实例和各命名空间
#[derive(Debug, Clone)]
pub struct StorageManager {
    kv: Arc<KvStore>,
    settings: Arc<SettingsStore>,
}

impl StorageManager {
    /// 打开（或创建）本地数据库
    pub async fn open(base_path: &Path) -> Result<Self> {
        let kv_path = base_path.join("kv");
        tokio::fs::create_dir_all(&kv_path)
            .await
            .map_err(|e| MirrorError::IO(format!("创建存储目录失败: {}", e)))?;

        let db = sled::open(&kv_path)
            .map_err(|e| MirrorError::KvStore(format!("打开 sled 数据库失败: {}", e)))?;
        let mirror = db
            .open_tree(MIRROR_TREE)
            .map_err(|e| MirrorError::KvStore(format!("打开 mirror tree 失败: {}", e)))?;
        let settings = db
            .open_tree(SETTINGS_TREE)
            .map_err(|e| MirrorError::KvStore(format!("打开 settings tree 失败: {}", e)))?;

        Ok(Self {
            kv: Arc::new(KvStore::new(mirror)),
            settings: Arc::new(SettingsStore::new(settings)),
        })
    }

    pub fn kv(&self) -> &Arc<KvStore> {
        &self.kv
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// 清空全部持久化状态（镜像 + 设置）
    pub async fn reset(&self) -> Result<()> {
        self.kv.clear().await?;
        self.settings.clear().await?;
        tracing::info!("持久化状态已清空");
        Ok(())
    }
}
