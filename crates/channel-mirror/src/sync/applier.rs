//! 差异应用器 - 将有界差异合并进本地有序存储
//!
//! 写入顺序是崩溃安全的关键：消息 / 对端记录 / pinned 集合先写，
//! 新 pts 最后写。pts 落盘前进程崩溃，下一次同步会以旧游标重新
//! 拉到同一段差异；上面所有写入都是幂等覆盖或集合成员操作，
//! 重放收敛到相同终态。

use tracing::debug;

use crate::error::Result;
use crate::storage::{keys, KvStore};
use crate::types::{BoundedDelta, ChannelUpdate, Message, NewMessage, PeerRecord};

/// 将一段有界差异应用到频道 `channel_id` 的本地镜像
///
/// 返回本次差异中出现的最大消息 id（仅供观测，无下游依赖）。
pub async fn apply_difference(
    kv: &KvStore,
    channel_id: u64,
    delta: &BoundedDelta,
) -> Result<Option<u64>> {
    let mut max_id: Option<u64> = None;

    for new_message in &delta.new_messages {
        match new_message {
            NewMessage::Empty { .. } => continue,
            NewMessage::Message(message) => {
                kv.set(keys::channel_message(channel_id, message.id), message)
                    .await?;
                max_id = Some(max_id.map_or(message.id, |m| m.max(message.id)));
            }
        }
    }

    for chat in &delta.chats {
        match chat {
            // channel 记录覆盖频道自身的元数据槽位
            PeerRecord::Channel(info) => {
                kv.set(keys::channel(channel_id), info).await?;
            }
            PeerRecord::Chat(info) => {
                kv.set(keys::chat(info.id), info).await?;
            }
            _ => {}
        }
    }

    for user in &delta.users {
        if let PeerRecord::User(info) = user {
            kv.set(keys::user(info.id), info).await?;
        }
    }

    for update in &delta.other_updates {
        match update {
            ChannelUpdate::EditMessage { message } => {
                kv.set(keys::channel_message(channel_id, message.id), message)
                    .await?;
            }
            ChannelUpdate::DeleteMessages { ids } => {
                apply_delete(kv, channel_id, ids).await?;
            }
            ChannelUpdate::PinMessages { pinned, ids } => {
                apply_pin(kv, channel_id, *pinned, ids).await?;
            }
        }
    }

    // 崩溃安全不变量：pts 必须在全部消息/对端/pin 写入之后落盘
    kv.set(keys::channel_pts(channel_id), &delta.pts).await?;

    debug!(
        "差异应用完成: channel={} pts={} max_message_id={:?}",
        channel_id, delta.pts, max_id
    );
    Ok(max_id)
}

async fn apply_delete(kv: &KvStore, channel_id: u64, ids: &[u64]) -> Result<()> {
    let mut pinned = load_pinned(kv, channel_id).await?;
    let mut modified = false;

    for &id in ids {
        kv.delete(keys::channel_message(channel_id, id)).await?;
        if let Some(pos) = pinned.iter().position(|&p| p == id) {
            pinned.remove(pos);
            modified = true;
        }
    }

    // pinned 集合没变就不写回
    if modified {
        kv.set(keys::channel_pinned(channel_id), &pinned).await?;
    }
    Ok(())
}

async fn apply_pin(kv: &KvStore, channel_id: u64, pin: bool, ids: &[u64]) -> Result<()> {
    let mut pinned = load_pinned(kv, channel_id).await?;

    for &id in ids {
        let key = keys::channel_message(channel_id, id);
        let Some(mut message) = kv.get::<_, Message>(&key).await? else {
            // 本地没有该消息（从未镜像到），跳过
            debug!("pin 事件指向未镜像消息，跳过: channel={} id={}", channel_id, id);
            continue;
        };
        message.pinned = pin;
        if pin {
            if !pinned.contains(&id) {
                pinned.push(id);
            }
        } else if let Some(pos) = pinned.iter().position(|&p| p == id) {
            pinned.remove(pos);
        }
        kv.set(&key, &message).await?;
    }

    pinned.sort_unstable();
    pinned.dedup();
    kv.set(keys::channel_pinned(channel_id), &pinned).await?;
    Ok(())
}

async fn load_pinned(kv: &KvStore, channel_id: u64) -> Result<Vec<u64>> {
    Ok(kv
        .get(keys::channel_pinned(channel_id))
        .await?
        .unwrap_or_default())
}
