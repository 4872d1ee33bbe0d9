//! 数据实体定义 - 镜像存储与差异同步的数据结构
//!
//! 这里定义了落库实体（消息 / 频道 / 群聊 / 用户）以及远端差异
//! 载荷（BoundedDelta / ChannelUpdate）。所有实体都以单个 JSON
//! 文档写入有序 KV 存储，key 布局见 `storage::keys`。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 频道引用 - 发起差异请求所需的最小凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: u64,
    pub access_hash: i64,
}

/// 频道实体 - 覆盖写入 `channel:<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: u64,
    pub access_hash: i64,
    pub title: String,
    pub username: Option<String>,
}

impl ChannelInfo {
    pub fn to_ref(&self) -> ChannelRef {
        ChannelRef {
            id: self.id,
            access_hash: self.access_hash,
        }
    }
}

/// 基础群聊实体 - 覆盖写入 `chat:<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInfo {
    pub id: u64,
    pub title: String,
}

/// 用户实体 - 覆盖写入 `user:<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// 消息实体 - 写入 `channel:<id>:message:<id>`
///
/// `pinned` 为可变字段，随 pin 事件置位/清除；其余字段在编辑
/// 事件中整体覆盖。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub from_id: Option<u64>,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

/// 差异中的"新消息"条目
///
/// Empty 是远端的占位标记（消息不存在 / 不可见），落库时跳过。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewMessage {
    Empty { id: u64 },
    Message(Message),
}

/// 差异中内嵌的对端记录
///
/// 应用时按 kind 分发：channel 覆盖频道自身元数据槽位，
/// chat / user 覆盖各自命名空间；其余 kind 忽略。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeerRecord {
    Channel(ChannelInfo),
    Chat(ChatInfo),
    User(UserInfo),
    Forbidden { id: u64 },
}

/// 异构 "other update" 事件 - 每个分支只携带自己需要的字段
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelUpdate {
    EditMessage { message: Message },
    DeleteMessages { ids: Vec<u64> },
    PinMessages { pinned: bool, ids: Vec<u64> },
}

/// 有界差异 - 自上次 pts 以来的全部变更 + 新 pts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedDelta {
    pub new_messages: Vec<NewMessage>,
    pub chats: Vec<PeerRecord>,
    pub users: Vec<PeerRecord>,
    pub other_updates: Vec<ChannelUpdate>,
    pub pts: u64,
}

/// 差异请求的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelDifference {
    Delta(BoundedDelta),
    /// 请求范围超出远端可一次 diff 的窗口
    TooLong { pts: u64 },
}

/// 用户名解析结果 - 进程内缓存，整体返回给调用方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPeer {
    pub chats: Vec<PeerRecord>,
    pub users: Vec<PeerRecord>,
}

impl ResolvedPeer {
    /// 取第一个 channel 类型的 chat（与远端返回顺序一致）
    pub fn first_channel(&self) -> Option<&ChannelInfo> {
        self.chats.iter().find_map(|c| match c {
            PeerRecord::Channel(info) => Some(info),
            _ => None,
        })
    }
}
