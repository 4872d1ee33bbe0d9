//! Key 编码 - 保序定宽十六进制编码 + 冒号拼接的复合 key
//!
//! 存储 key 形如 `channel:<id16>:message:<id14>`。数字段零填充到
//! 固定宽度，字节序比较与数值序一致，因此按前缀反向扫描即可得到
//! 按 id 降序的消息。分隔符 `:` 不会出现在任何段内。
//!
//! 宽段 16 位 hex（64 位的频道 / 群聊 / 用户 id），窄段 14 位 hex
//! （消息 id、pts、游标）。超出宽度可表示范围属于编程错误，直接
//! panic 而不是返回可恢复错误。

/// 窄段可表示的最大值（14 位 hex，56 bit）
pub const NARROW_MAX: u64 = (1 << 56) - 1;

const SEPARATOR: char = ':';

/// 复合 key 的类型化分段
#[derive(Debug, Clone, Copy)]
pub enum Part<'a> {
    /// 字面量段（命名空间名），不得含分隔符
    Text(&'a str),
    /// 16 位 hex，64 位 id
    Wide(u64),
    /// 14 位 hex，消息 id / pts / 游标
    Narrow(u64),
}

/// 16 位 hex 定宽编码，u64 全域可表示
pub fn encode_wide(value: u64) -> String {
    format!("{:016x}", value)
}

/// 14 位 hex 定宽编码
///
/// # Panics
/// `value > NARROW_MAX` 时 panic。
pub fn encode_narrow(value: u64) -> String {
    assert!(
        value <= NARROW_MAX,
        "narrow key segment out of range: {} > {}",
        value,
        NARROW_MAX
    );
    format!("{:014x}", value)
}

/// 按分隔符拼接各段
pub fn join_parts(parts: &[Part<'_>]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        match part {
            Part::Text(s) => {
                debug_assert!(!s.contains(SEPARATOR), "literal segment contains separator");
                out.push_str(s);
            }
            Part::Wide(v) => out.push_str(&encode_wide(*v)),
            Part::Narrow(v) => out.push_str(&encode_narrow(*v)),
        }
    }
    out
}

pub fn channel(id: u64) -> String {
    join_parts(&[Part::Text("channel"), Part::Wide(id)])
}

pub fn channel_message(channel_id: u64, message_id: u64) -> String {
    join_parts(&[
        Part::Text("channel"),
        Part::Wide(channel_id),
        Part::Text("message"),
        Part::Narrow(message_id),
    ])
}

/// 消息命名空间前缀（含结尾分隔符），用于范围扫描
pub fn channel_message_prefix(channel_id: u64) -> String {
    let mut prefix = join_parts(&[
        Part::Text("channel"),
        Part::Wide(channel_id),
        Part::Text("message"),
    ]);
    prefix.push(SEPARATOR);
    prefix
}

pub fn channel_pinned(channel_id: u64) -> String {
    join_parts(&[
        Part::Text("channel"),
        Part::Wide(channel_id),
        Part::Text("pinned"),
    ])
}

pub fn channel_pts(channel_id: u64) -> String {
    join_parts(&[
        Part::Text("channel"),
        Part::Wide(channel_id),
        Part::Text("pts"),
    ])
}

pub fn chat(id: u64) -> String {
    join_parts(&[Part::Text("chat"), Part::Wide(id)])
}

pub fn user(id: u64) -> String {
    join_parts(&[Part::Text("user"), Part::Wide(id)])
}
