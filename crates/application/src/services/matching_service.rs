//! 撮合协调器
//!
//! 实现 join/cancel/select 三个转移。请求生命周期：
//! `NONE → PENDING（join）→ CANCELLED（cancel）| MATCHED（select）`，
//! PENDING 是唯一非终态，新的 join 总是产生新请求。
//!
//! 操作返回出站效果列表，由传输层投递；这里不接触 socket。

use std::sync::Arc;

use domain::{
    ConnectionId, Coordinate, DomainError, Identity, Outbound, RequestedTime, Ride, RideId,
    RideRequest, RoomKey, ServerEvent, UserId, VehicleClass,
};
use uuid::Uuid;

use crate::{
    clock::Clock, error::ApplicationError, registry::PendingRequestRegistry,
    repository::RideStore, sessions::{Channel, SessionDirectory},
};

/// 乘客 join 的意图数据（乘客 id 来自身份，不由载荷决定）。
#[derive(Debug, Clone)]
pub struct RideIntent {
    pub vehicle_class: VehicleClass,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub destination_text: String,
    pub requested_time: RequestedTime,
}

pub struct MatchingDependencies {
    pub registry: Arc<PendingRequestRegistry>,
    pub sessions: Arc<SessionDirectory>,
    pub rides: Arc<dyn RideStore>,
    pub clock: Arc<dyn Clock>,
}

pub struct MatchingCoordinator {
    deps: MatchingDependencies,
}

impl MatchingCoordinator {
    pub fn new(deps: MatchingDependencies) -> Self {
        Self { deps }
    }

    /// 活跃行程守卫：名下还有未到达的行程时不能再次进入撮合。
    async fn guard_not_in_ride(&self, identity: &Identity) -> Result<(), ApplicationError> {
        let active = match identity {
            Identity::Driver { id, .. } => self.deps.rides.find_active_by_driver(*id).await?,
            Identity::Rider { id } => self.deps.rides.find_active_by_rider(*id).await?,
        };
        if active.is_some() {
            return Err(DomainError::AlreadyInRide.into());
        }
        Ok(())
    }

    /// 进入撮合交换。
    ///
    /// 司机：进入本车类的 DECIDING 房间，并以逐条 `giveride` 回放当前
    /// 快照。广播发生前已在房间里的司机实时收到新请求，之后加入的
    /// 司机靠这份快照补齐，没有更多的重放机制。
    ///
    /// 乘客：构建请求入队，进入自己的 WAITING 房间，同时向本车类的
    /// DECIDING 房间广播新请求。
    pub async fn join(
        &self,
        identity: &Identity,
        connection: ConnectionId,
        intent: Option<RideIntent>,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        self.guard_not_in_ride(identity).await?;
        self.deps
            .sessions
            .record(Channel::Exchange, identity.id(), connection)
            .await;

        match identity {
            Identity::Driver { vehicle_class, .. } => {
                let mut effects = vec![Outbound::JoinRoom(RoomKey::Deciding(
                    vehicle_class.clone(),
                ))];
                for pending in self.deps.registry.peek_all(vehicle_class).await {
                    effects.push(Outbound::ToCaller(ServerEvent::GiveRide(pending)));
                }
                Ok(effects)
            }
            Identity::Rider { id } => {
                let intent = intent.ok_or_else(|| {
                    DomainError::invalid_argument("join", "rider join requires ride details")
                })?;
                if let RequestedTime::At(instant) = intent.requested_time {
                    if instant <= self.deps.clock.now() {
                        return Err(DomainError::invalid_argument(
                            "requested_time",
                            "must be in the future",
                        )
                        .into());
                    }
                }

                let request = RideRequest {
                    rider_id: *id,
                    vehicle_class: intent.vehicle_class.clone(),
                    pickup: intent.pickup,
                    destination: intent.destination,
                    destination_text: intent.destination_text,
                    requested_time: intent.requested_time,
                };
                self.deps.registry.enqueue(request.clone()).await?;
                tracing::info!(
                    rider_id = %id,
                    vehicle_class = %request.vehicle_class,
                    "ride request queued"
                );

                Ok(vec![
                    Outbound::JoinRoom(RoomKey::Waiting(*id)),
                    Outbound::ToRoom(
                        RoomKey::Deciding(intent.vehicle_class),
                        ServerEvent::GiveRide(request),
                    ),
                ])
            }
        }
    }

    /// 乘客取消自己的待撮合请求。没有待撮合请求时无操作，不报错；
    /// 司机调用也是无操作。
    pub async fn cancel(&self, identity: &Identity) -> Result<Vec<Outbound>, ApplicationError> {
        if identity.is_driver() {
            return Ok(Vec::new());
        }
        if let Some(cancelled) = self.deps.registry.remove_by_rider(identity.id()).await {
            tracing::info!(
                rider_id = %identity.id(),
                vehicle_class = %cancelled.vehicle_class,
                "ride request cancelled"
            );
        }
        Ok(Vec::new())
    }

    /// 司机选中某个乘客的请求。
    ///
    /// 队列移除是提交点：两个司机并发选择同一请求时恰好一个成功，
    /// 另一个观察到 "not found"，按预期竞争静默处理，不记为错误。
    pub async fn select(
        &self,
        identity: &Identity,
        rider_id: UserId,
        vehicle_class: &VehicleClass,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let driver_id = match identity {
            Identity::Driver { id, .. } => *id,
            Identity::Rider { .. } => return Ok(Vec::new()),
        };

        let request = match self.deps.registry.dequeue(vehicle_class, rider_id).await {
            Ok(request) => request,
            Err(DomainError::NotFound { .. }) => {
                tracing::debug!(
                    %rider_id,
                    %vehicle_class,
                    "request already matched or cancelled"
                );
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let ride = Ride::from_request(RideId::new(Uuid::new_v4()), driver_id, request);
        let ride_id = self.deps.rides.create(ride).await?;
        tracing::info!(%ride_id, %driver_id, %rider_id, "ride matched");

        Ok(vec![
            Outbound::ToRoom(RoomKey::Waiting(rider_id), ServerEvent::GotRide { ride_id }),
            Outbound::ToCaller(ServerEvent::Redirect {
                url: format!("/rides/{ride_id}"),
            }),
        ])
    }
}
