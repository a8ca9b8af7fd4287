//! WebSocket 连接主循环
//!
//! 一条连接对应一个逻辑频道。客户端帧解析后分发给协调器，协调器
//! 返回的出站效果在这里应用到广播网关；网关推来的事件泵回 socket。

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};

use application::{ApplicationError, BroadcastGateway, Channel, RideIntent};
use domain::{
    ConnectionId, DomainError, Identity, Outbound, RideId, ServerEvent, UserId, VehicleClass,
};

use crate::protocol::{
    failure_event, ChatPayload, ClientFrame, RideRefPayload, RiderJoinPayload, SelectPayload,
};
use crate::state::AppState;

/// 连接生命周期：注册、泵出、分发、清理。
pub async fn run(socket: WebSocket, state: AppState, identity: Identity, channel: Channel) {
    let connection = ConnectionId::generate();
    let mut events = state.gateway.register(connection).await;
    tracing::info!(user_id = %identity.id(), ?channel, %connection, "WebSocket 连接已建立");

    let (mut sender, mut incoming) = socket.split();

    // 网关 -> socket 的泵。序列化失败只影响单个事件。
    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(frame) => {
                    if sender.send(WsMessage::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, event = event.name(), "event serialization failed");
                }
            }
        }
    });

    while let Some(message) = incoming.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, %connection, "socket read failed");
                break;
            }
        };
        match message {
            WsMessage::Text(raw) => {
                handle_frame(&state, &identity, connection, channel, raw.as_str()).await;
            }
            WsMessage::Close(_) => break,
            // Ping/Pong 由 axum 处理，Binary 不在协议里
            _ => {}
        }
    }

    // 断开：退出所有房间并丢弃后续发送，不重试
    state.gateway.unregister(connection).await;
    state
        .sessions
        .remove(channel, identity.id(), connection)
        .await;
    pump.abort();
    tracing::info!(user_id = %identity.id(), %connection, "WebSocket 连接已断开");
}

async fn handle_frame(
    state: &AppState,
    identity: &Identity,
    connection: ConnectionId,
    channel: Channel,
    raw: &str,
) {
    let frame = match ClientFrame::parse(raw) {
        Ok(frame) => frame,
        Err(err) => {
            let failed = ServerEvent::Failed {
                msg: format!("malformed frame: {err}"),
            };
            let _ = state.gateway.emit_to(connection, failed).await;
            return;
        }
    };

    match dispatch(state, identity, connection, channel, &frame).await {
        Ok(effects) => {
            if let Err(err) = apply(state, connection, effects).await {
                tracing::error!(error = %err, %connection, "failed to deliver events");
            }
        }
        Err(err) if err.is_caller_fault() => {
            let _ = state.gateway.emit_to(connection, failure_event(&err)).await;
        }
        Err(err) => {
            tracing::error!(error = %err, event = %frame.event, "event handling failed");
            let _ = state.gateway.emit_to(connection, failure_event(&err)).await;
        }
    }
}

/// 把客户端帧路由到对应协调器操作。
async fn dispatch(
    state: &AppState,
    identity: &Identity,
    connection: ConnectionId,
    channel: Channel,
    frame: &ClientFrame,
) -> Result<Vec<Outbound>, ApplicationError> {
    match (channel, frame.event.as_str()) {
        (Channel::Exchange, "join") => {
            let intent = match identity {
                Identity::Driver { .. } => None,
                Identity::Rider { .. } => {
                    let payload: RiderJoinPayload = frame.payload()?;
                    Some(RideIntent {
                        vehicle_class: VehicleClass::parse(payload.vehicle_class)?,
                        pickup: payload.pickup,
                        destination: payload.destination,
                        destination_text: payload.destination_text,
                        requested_time: payload.requested_time,
                    })
                }
            };
            state.matching.join(identity, connection, intent).await
        }
        (Channel::Exchange, "cancel") => state.matching.cancel(identity).await,
        (Channel::Exchange, "select") => {
            let payload: SelectPayload = frame.payload()?;
            let vehicle_class = VehicleClass::parse(payload.vehicle_class)?;
            state
                .matching
                .select(identity, UserId::new(payload.rider_id), &vehicle_class)
                .await
        }
        (Channel::Ride, "join") | (Channel::Chat, "join") => {
            let payload: RideRefPayload = frame.payload()?;
            state
                .ride_session
                .join_ride(identity, connection, channel, RideId::new(payload.id))
                .await
        }
        (Channel::Ride, "triggerarrived") => {
            let payload: RideRefPayload = frame.payload()?;
            state
                .ride_session
                .trigger_arrived(identity, RideId::new(payload.id))
                .await
        }
        (Channel::Chat, "chat") => {
            let payload: ChatPayload = frame.payload()?;
            state
                .ride_session
                .post_chat(identity, RideId::new(payload.id), payload.message)
                .await
        }
        (_, unknown) => {
            Err(DomainError::invalid_argument("event", format!("unknown event {unknown}")).into())
        }
    }
}

/// 应用出站效果。JoinRoom 先于事件投递执行，保证加入顺序语义。
async fn apply(
    state: &AppState,
    connection: ConnectionId,
    effects: Vec<Outbound>,
) -> Result<(), ApplicationError> {
    for effect in effects {
        match effect {
            Outbound::JoinRoom(room) => state.gateway.join_room(connection, room).await?,
            Outbound::ToRoom(room, event) => state.gateway.emit(&room, event).await?,
            Outbound::ToCaller(event) => state.gateway.emit_to(connection, event).await?,
        }
    }
    Ok(())
}
