//! HTTP 服务层 - 核心之上的非正式 REST 表面
//!
//! 路由：
//! - `POST /reset`                      清空持久化状态与进程内缓存
//! - `GET  /`                           远端配置快照（诊断）
//! - `GET  /resolve/{name}`             对端解析
//! - `GET  /channel/{ref}/messages`     sync-then-read 分页读取
//!
//! 任何未捕获错误统一转成 500 + 纯文本错误消息，无结构化错误体。
//! cursor/limit 校验在任何远端或存储调用之前完成。

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::error;

use crate::error::{MirrorError, Result};
use crate::service::MirrorService;
use crate::sync::{validate_cursor, validate_limit};
use crate::types::{Message, ResolvedPeer};

/// 构建挂在 [`MirrorService`] 上的路由
pub fn router(service: Arc<MirrorService>) -> Router {
    Router::new()
        .route("/reset", post(reset))
        .route("/", get(remote_config))
        .route("/resolve/{name}", get(resolve))
        .route("/channel/{reference}/messages", get(channel_messages))
        .with_state(service)
}

/// 统一错误响应：500 + Display 文本
struct AppError(MirrorError);

impl From<MirrorError> for AppError {
    fn from(err: MirrorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("请求处理失败: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

async fn reset(State(service): State<Arc<MirrorService>>) -> std::result::Result<(), AppError> {
    service.ensure_init().await?;
    service.reset().await?;
    Ok(())
}

async fn remote_config(
    State(service): State<Arc<MirrorService>>,
) -> std::result::Result<Json<serde_json::Value>, AppError> {
    service.ensure_init().await?;
    let config = service.remote_config().await?;
    Ok(Json(config))
}

async fn resolve(
    State(service): State<Arc<MirrorService>>,
    Path(name): Path<String>,
) -> std::result::Result<Json<ResolvedPeer>, AppError> {
    service.ensure_init().await?;
    let peer = service.resolve(&name).await?;
    Ok(Json(peer))
}

async fn channel_messages(
    State(service): State<Arc<MirrorService>>,
    Path(reference): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> std::result::Result<Json<Vec<Message>>, AppError> {
    // 校验先于 ensure_init：非法参数不触发任何远端/存储调用
    let cursor = require_int(params.get("cursor"), 0)?;
    validate_cursor(cursor)?;
    let limit = require_int(params.get("limit"), 100)? as usize;
    validate_limit(limit)?;

    service.ensure_init().await?;
    let messages = service.channel_messages(&reference, cursor, limit).await?;
    Ok(Json(messages))
}

/// 非负十进制整数参数；缺失取默认值，其余一律拒绝
fn require_int(value: Option<&String>, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse()
            .map_err(|_| MirrorError::InvalidArgument(format!("integer out of range: {}", s))),
        Some(s) => Err(MirrorError::InvalidArgument(format!(
            "not a non-negative integer: {}",
            s
        ))),
    }
}
