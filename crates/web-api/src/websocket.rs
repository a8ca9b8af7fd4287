//! WebSocket 升级入口
//!
//! 三个逻辑频道各一个端点，升级前用 `?token=` 校验身份。
//! 认证失败在升级阶段拒绝，之后的守卫失败走 `Failed` 事件。

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;

use application::Channel;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws_connection;

/// WebSocket 连接查询参数
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// 上游身份提供方签发的 token
    pub token: String,
}

async fn upgrade(
    ws: WebSocketUpgrade,
    state: AppState,
    query: WsQuery,
    channel: Channel,
) -> Result<Response, ApiError> {
    let identity = state.jwt_service.identity_from_token(&query.token)?;
    Ok(ws.on_upgrade(move |socket| ws_connection::run(socket, state, identity, channel)))
}

/// 撮合交换频道：join / cancel / select
pub async fn exchange(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    upgrade(ws, state, query, Channel::Exchange).await
}

/// 行程频道：join / triggerarrived
pub async fn ride(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    upgrade(ws, state, query, Channel::Ride).await
}

/// 聊天频道：join / chat
pub async fn chat(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    upgrade(ws, state, query, Channel::Chat).await
}
