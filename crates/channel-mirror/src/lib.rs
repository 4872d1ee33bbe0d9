//! Channel Mirror SDK - 频道历史的本地增量镜像
//!
//! 远端消息服务只提供差异同步原语（没有廉价且完整的"拉全量历史"
//! 调用），本 crate 在其上维护一份本地可持久化、增量推进的频道
//! 消息镜像，支持不重复拉取全量历史的分页读取：
//! - 📍 每频道进度游标（pts），先持久化后使用，崩溃重放安全
//! - 🔀 异构差异合并：新增 / 编辑 / 删除 / 置顶，全部幂等覆盖
//! - 🔑 保序 key 编码：数字 id 的定宽 hex，前缀扫描即按 id 有序
//! - 📖 sync-then-read：每次读取前先把镜像推进到远端当前状态
//! - 🌐 axum HTTP 表面：reset / resolve / 分页消息读取
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use channel_mirror::{MirrorService, StorageManager};
//! # use channel_mirror::remote::DeltaSource;
//!
//! # async fn run(source: Arc<dyn DeltaSource>) -> channel_mirror::Result<()> {
//! let storage = StorageManager::open(std::path::Path::new("/var/lib/mirror")).await?;
//! let service = Arc::new(MirrorService::new(source, storage));
//!
//! let app = channel_mirror::http::router(service);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod directory;
pub mod error;
pub mod http;
pub mod init;
pub mod remote;
pub mod service;
pub mod storage;
pub mod sync;
pub mod types;

pub use error::{MirrorError, Result};
pub use remote::{DeltaSource, MIN_PTS};
pub use service::MirrorService;
pub use storage::{KvStore, SettingsStore, StorageManager};
pub use sync::SyncEngine;
pub use types::{
    BoundedDelta, ChannelDifference, ChannelInfo, ChannelRef, ChannelUpdate, ChatInfo, Message,
    NewMessage, PeerRecord, ResolvedPeer, UserInfo,
};
