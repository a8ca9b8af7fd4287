// 进程内广播网关实现
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use domain::{ConnectionId, RoomKey, ServerEvent};
use tokio::sync::{mpsc, RwLock};

use crate::broadcaster::{BroadcastError, BroadcastGateway};

#[derive(Default)]
struct GatewayState {
    senders: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    rooms: HashMap<RoomKey, HashSet<ConnectionId>>,
}

/// 每个连接一个无界通道，房间是成员集合。
#[derive(Default)]
pub struct LocalBroadcastGateway {
    state: RwLock<GatewayState>,
}

impl LocalBroadcastGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册连接，返回该连接的事件接收端，由传输层泵到 socket。
    pub async fn register(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.write().await.senders.insert(connection, sender);
        receiver
    }

    /// 注销连接并退出它所在的所有房间。
    pub async fn unregister(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        state.senders.remove(&connection);
        state.rooms.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }
}

#[async_trait]
impl BroadcastGateway for LocalBroadcastGateway {
    async fn join_room(
        &self,
        connection: ConnectionId,
        room: RoomKey,
    ) -> Result<(), BroadcastError> {
        let mut state = self.state.write().await;
        if !state.senders.contains_key(&connection) {
            return Err(BroadcastError::failed("connection is not registered"));
        }
        state.rooms.entry(room).or_default().insert(connection);
        Ok(())
    }

    async fn leave_room(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
    ) -> Result<(), BroadcastError> {
        let mut state = self.state.write().await;
        if let Some(members) = state.rooms.get_mut(room) {
            members.remove(&connection);
            if members.is_empty() {
                state.rooms.remove(room);
            }
        }
        Ok(())
    }

    async fn emit(&self, room: &RoomKey, event: ServerEvent) -> Result<(), BroadcastError> {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(room) else {
            return Ok(());
        };
        for member in members {
            if let Some(sender) = state.senders.get(member) {
                // 接收端已随连接一起消失时静默丢弃
                let _ = sender.send(event.clone());
            }
        }
        Ok(())
    }

    async fn emit_to(
        &self,
        connection: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), BroadcastError> {
        let state = self.state.read().await;
        if let Some(sender) = state.senders.get(&connection) {
            let _ = sender.send(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{RideId, UserId};
    use uuid::Uuid;

    #[tokio::test]
    async fn emit_reaches_every_room_member() {
        let gateway = LocalBroadcastGateway::new();
        let room = RoomKey::Ride(RideId::new(Uuid::new_v4()));

        let first = ConnectionId::generate();
        let second = ConnectionId::generate();
        let mut first_rx = gateway.register(first).await;
        let mut second_rx = gateway.register(second).await;
        gateway.join_room(first, room.clone()).await.unwrap();
        gateway.join_room(second, room.clone()).await.unwrap();

        gateway.emit(&room, ServerEvent::Refresh).await.unwrap();

        assert_eq!(first_rx.recv().await, Some(ServerEvent::Refresh));
        assert_eq!(second_rx.recv().await, Some(ServerEvent::Refresh));
    }

    #[tokio::test]
    async fn emit_to_unknown_room_is_a_no_op() {
        let gateway = LocalBroadcastGateway::new();
        let room = RoomKey::Waiting(UserId::new(Uuid::new_v4()));
        assert!(gateway.emit(&room, ServerEvent::Refresh).await.is_ok());
    }

    #[tokio::test]
    async fn unregistered_connection_no_longer_receives() {
        let gateway = LocalBroadcastGateway::new();
        let room = RoomKey::Ride(RideId::new(Uuid::new_v4()));

        let leaver = ConnectionId::generate();
        let stayer = ConnectionId::generate();
        let mut leaver_rx = gateway.register(leaver).await;
        let mut stayer_rx = gateway.register(stayer).await;
        gateway.join_room(leaver, room.clone()).await.unwrap();
        gateway.join_room(stayer, room.clone()).await.unwrap();

        gateway.unregister(leaver).await;
        gateway.emit(&room, ServerEvent::Refresh).await.unwrap();

        assert_eq!(stayer_rx.recv().await, Some(ServerEvent::Refresh));
        assert_eq!(leaver_rx.recv().await, None);
    }

    #[tokio::test]
    async fn leaving_a_room_stops_fan_out_but_keeps_the_connection() {
        let gateway = LocalBroadcastGateway::new();
        let room = RoomKey::Ride(RideId::new(Uuid::new_v4()));

        let connection = ConnectionId::generate();
        let mut rx = gateway.register(connection).await;
        gateway.join_room(connection, room.clone()).await.unwrap();
        gateway.leave_room(connection, &room).await.unwrap();

        gateway.emit(&room, ServerEvent::Refresh).await.unwrap();
        gateway
            .emit_to(connection, ServerEvent::Failed { msg: "direct".into() })
            .await
            .unwrap();

        // 只收到单播，房间广播已经收不到了
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::Failed { msg: "direct".into() })
        );
    }

    #[tokio::test]
    async fn join_requires_registration() {
        let gateway = LocalBroadcastGateway::new();
        let room = RoomKey::Ride(RideId::new(Uuid::new_v4()));
        let result = gateway.join_room(ConnectionId::generate(), room).await;
        assert!(result.is_err());
    }
}
