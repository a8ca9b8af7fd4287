use async_trait::async_trait;
use domain::{ChatEntry, Ride, RideId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RideStoreError {
    #[error("ride not found")]
    NotFound,
    #[error("ride already arrived")]
    AlreadyArrived,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl RideStoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// 行程记录的持久化端口。
///
/// 实现必须保证单条记录内的修改是原子的：并发的聊天追加和到达转移
/// 不能互相丢失更新。
#[async_trait]
pub trait RideStore: Send + Sync {
    async fn create(&self, ride: Ride) -> Result<RideId, RideStoreError>;

    async fn get(&self, id: RideId) -> Result<Option<Ride>, RideStoreError>;

    /// 追加一条聊天消息。对同一行程原子。
    async fn append_chat(&self, id: RideId, entry: ChatEntry) -> Result<(), RideStoreError>;

    /// 到达转移：一次性设置 arrived 和 cost。
    ///
    /// 条件更新：行程已到达时返回 `AlreadyArrived`，不存在时返回
    /// `NotFound`，并发的二次触发最多一个成功。
    async fn set_arrived(&self, id: RideId, cost: i64) -> Result<(), RideStoreError>;

    /// 司机名下尚未到达的行程（活跃行程守卫用）。
    async fn find_active_by_driver(
        &self,
        driver_id: UserId,
    ) -> Result<Option<Ride>, RideStoreError>;

    /// 乘客名下尚未到达的行程。
    async fn find_active_by_rider(&self, rider_id: UserId)
        -> Result<Option<Ride>, RideStoreError>;
}

/// 内存实现（用于测试和本地开发）
pub mod memory {
    use std::collections::HashMap;

    use tokio::sync::RwLock;

    use super::*;

    #[derive(Default)]
    pub struct MemoryRideStore {
        rides: RwLock<HashMap<RideId, Ride>>,
    }

    impl MemoryRideStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl RideStore for MemoryRideStore {
        async fn create(&self, ride: Ride) -> Result<RideId, RideStoreError> {
            let id = ride.id;
            self.rides.write().await.insert(id, ride);
            Ok(id)
        }

        async fn get(&self, id: RideId) -> Result<Option<Ride>, RideStoreError> {
            Ok(self.rides.read().await.get(&id).cloned())
        }

        async fn append_chat(&self, id: RideId, entry: ChatEntry) -> Result<(), RideStoreError> {
            let mut rides = self.rides.write().await;
            let ride = rides.get_mut(&id).ok_or(RideStoreError::NotFound)?;
            ride.chat.push(entry);
            Ok(())
        }

        async fn set_arrived(&self, id: RideId, cost: i64) -> Result<(), RideStoreError> {
            let mut rides = self.rides.write().await;
            let ride = rides.get_mut(&id).ok_or(RideStoreError::NotFound)?;
            if ride.arrived {
                return Err(RideStoreError::AlreadyArrived);
            }
            ride.arrived = true;
            ride.cost = Some(cost);
            Ok(())
        }

        async fn find_active_by_driver(
            &self,
            driver_id: UserId,
        ) -> Result<Option<Ride>, RideStoreError> {
            let rides = self.rides.read().await;
            Ok(rides
                .values()
                .find(|ride| ride.driver_id == driver_id && !ride.arrived)
                .cloned())
        }

        async fn find_active_by_rider(
            &self,
            rider_id: UserId,
        ) -> Result<Option<Ride>, RideStoreError> {
            let rides = self.rides.read().await;
            Ok(rides
                .values()
                .find(|ride| ride.rider_id == rider_id && !ride.arrived)
                .cloned())
        }
    }
}
