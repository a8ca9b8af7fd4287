//! 会话目录
//!
//! 每个逻辑频道内，用户到活跃连接句柄的映射。重连时覆盖旧句柄，
//! 不累积陈旧条目。

use std::collections::HashMap;

use domain::{ConnectionId, UserId};
use tokio::sync::RwLock;

/// 三个逻辑频道，各自独立加入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Exchange,
    Ride,
    Chat,
}

#[derive(Default)]
pub struct SessionDirectory {
    handles: RwLock<HashMap<(Channel, UserId), ConnectionId>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录用户在某频道的连接句柄，覆盖旧值。
    pub async fn record(&self, channel: Channel, user_id: UserId, connection: ConnectionId) {
        self.handles
            .write()
            .await
            .insert((channel, user_id), connection);
    }

    pub async fn get(&self, channel: Channel, user_id: UserId) -> Option<ConnectionId> {
        self.handles.read().await.get(&(channel, user_id)).copied()
    }

    /// 断开清理。只在句柄仍指向该连接时移除，重连覆盖过的条目保留。
    pub async fn remove(&self, channel: Channel, user_id: UserId, connection: ConnectionId) {
        let mut handles = self.handles.write().await;
        if handles.get(&(channel, user_id)) == Some(&connection) {
            handles.remove(&(channel, user_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn rejoin_overwrites_the_stale_handle() {
        let directory = SessionDirectory::new();
        let user_id = UserId::new(Uuid::new_v4());
        let stale = ConnectionId::generate();
        let fresh = ConnectionId::generate();

        directory.record(Channel::Exchange, user_id, stale).await;
        directory.record(Channel::Exchange, user_id, fresh).await;

        assert_eq!(directory.get(Channel::Exchange, user_id).await, Some(fresh));
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let directory = SessionDirectory::new();
        let user_id = UserId::new(Uuid::new_v4());
        let connection = ConnectionId::generate();

        directory.record(Channel::Ride, user_id, connection).await;

        assert_eq!(directory.get(Channel::Chat, user_id).await, None);
        assert_eq!(directory.get(Channel::Ride, user_id).await, Some(connection));
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_evict_the_new_handle() {
        let directory = SessionDirectory::new();
        let user_id = UserId::new(Uuid::new_v4());
        let stale = ConnectionId::generate();
        let fresh = ConnectionId::generate();

        directory.record(Channel::Exchange, user_id, stale).await;
        directory.record(Channel::Exchange, user_id, fresh).await;
        directory.remove(Channel::Exchange, user_id, stale).await;

        assert_eq!(directory.get(Channel::Exchange, user_id).await, Some(fresh));
    }
}
