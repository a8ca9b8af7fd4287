use async_trait::async_trait;
use domain::{ConnectionId, RoomKey, ServerEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 把事件投递到逻辑房间/指定连接的网关。
///
/// 同一房间内的投递顺序等于调用顺序；不同房间之间没有顺序保证。
/// 已断开连接的发送被静默丢弃，不重试。
#[async_trait]
pub trait BroadcastGateway: Send + Sync {
    async fn join_room(&self, connection: ConnectionId, room: RoomKey)
        -> Result<(), BroadcastError>;

    async fn leave_room(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
    ) -> Result<(), BroadcastError>;

    /// 向房间内所有成员广播。
    async fn emit(&self, room: &RoomKey, event: ServerEvent) -> Result<(), BroadcastError>;

    /// 单播给某个连接。
    async fn emit_to(
        &self,
        connection: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), BroadcastError>;
}
