//! 行程会话协调器
//!
//! 撮合成功之后的事件：进入行程房间、聊天追加、到达触发与开票。

use std::sync::Arc;

use domain::{
    ChatEntry, ConnectionId, DomainError, Identity, Outbound, Ride, RideId, RoomKey, ServerEvent,
};
use rand::Rng;

use crate::{
    error::ApplicationError,
    notifier::Notifier,
    repository::{RideStore, RideStoreError},
    sessions::{Channel, SessionDirectory},
};

/// 占位车费的取值区间（含两端）。
const FARE_MIN: i64 = 1;
const FARE_MAX: i64 = 100;

pub struct RideSessionDependencies {
    pub sessions: Arc<SessionDirectory>,
    pub rides: Arc<dyn RideStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct RideSessionCoordinator {
    deps: RideSessionDependencies,
}

impl RideSessionCoordinator {
    pub fn new(deps: RideSessionDependencies) -> Self {
        Self { deps }
    }

    /// 行程必须存在且调用方是参与者之一。
    async fn authorized_ride(
        &self,
        identity: &Identity,
        ride_id: RideId,
    ) -> Result<Ride, ApplicationError> {
        let ride = self
            .deps
            .rides
            .get(ride_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ride"))?;
        if !ride.is_party(identity.id()) {
            return Err(DomainError::Unauthorized.into());
        }
        Ok(ride)
    }

    /// 进入行程/聊天房间。
    pub async fn join_ride(
        &self,
        identity: &Identity,
        connection: ConnectionId,
        channel: Channel,
        ride_id: RideId,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let ride = self.authorized_ride(identity, ride_id).await?;
        self.deps
            .sessions
            .record(channel, identity.id(), connection)
            .await;
        Ok(vec![Outbound::JoinRoom(RoomKey::Ride(ride.id))])
    }

    /// 聊天追加：写入存储后向行程房间广播 refresh。
    /// 同一发送者的消息按发送顺序投递，全局顺序跟随存储追加顺序。
    pub async fn post_chat(
        &self,
        identity: &Identity,
        ride_id: RideId,
        message: String,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        if message.trim().is_empty() {
            return Err(DomainError::invalid_argument("message", "cannot be empty").into());
        }
        let ride = self.authorized_ride(identity, ride_id).await?;
        let entry = ChatEntry {
            sender: identity.role(),
            message,
        };
        self.deps.rides.append_chat(ride.id, entry).await?;
        Ok(vec![Outbound::ToRoom(
            RoomKey::Ride(ride.id),
            ServerEvent::Refresh,
        )])
    }

    /// 司机触发到达：计费、原子转移 arrived+cost、广播 refresh、
    /// 尽力通知乘客。对已到达行程的二次触发被拒绝。
    pub async fn trigger_arrived(
        &self,
        identity: &Identity,
        ride_id: RideId,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let ride = self
            .deps
            .rides
            .get(ride_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ride"))?;
        if ride.driver_id != identity.id() {
            return Err(DomainError::Unauthorized.into());
        }

        let cost = rand::rng().random_range(FARE_MIN..=FARE_MAX);
        self.deps
            .rides
            .set_arrived(ride.id, cost)
            .await
            .map_err(|err| match err {
                RideStoreError::NotFound => ApplicationError::from(DomainError::not_found("ride")),
                RideStoreError::AlreadyArrived => {
                    ApplicationError::from(DomainError::AlreadyArrived)
                }
                other => ApplicationError::from(other),
            })?;
        tracing::info!(%ride_id, cost, "ride arrived");

        // 通知失败不中断到达转移
        let body = format!("Hello! You owe {cost}$ to your driver!");
        if let Err(err) = self
            .deps
            .notifier
            .notify(ride.rider_id, "Ride completed!", &body)
            .await
        {
            tracing::warn!(error = %err, rider_id = %ride.rider_id, "rider notification failed");
        }

        Ok(vec![Outbound::ToRoom(
            RoomKey::Ride(ride.id),
            ServerEvent::Refresh,
        )])
    }
}
