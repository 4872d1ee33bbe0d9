//! 频道差异同步 - cursor + applier + engine
//!
//! 与对端解析正交：引擎只认 `ChannelRef`，名称/id 到引用的映射
//! 在 `directory` 中完成。

pub mod applier;
mod cursor_store;
mod engine;

pub use cursor_store::PtsStore;
pub use engine::{validate_cursor, validate_limit, SyncEngine, LIMIT_MAX, LIMIT_MIN};
