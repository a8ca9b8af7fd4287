//! 行程记录
//!
//! 撮合成功时创建，之后只允许两类修改：聊天追加、到达+计费。
//! 到达并开票后不再有任何状态转移。

use serde::{Deserialize, Serialize};

use crate::entities::identity::Role;
use crate::entities::ride_request::RideRequest;
use crate::value_objects::{Coordinate, RequestedTime, RideId, UserId};

/// 聊天记录的一条消息。全局顺序跟随存储层的追加顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Role,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub driver_id: UserId,
    pub rider_id: UserId,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub destination_text: String,
    pub requested_time: RequestedTime,
    pub chat: Vec<ChatEntry>,
    pub arrived: bool,
    pub cost: Option<i64>,
}

impl Ride {
    /// 从被选中的请求创建行程：聊天记录为空，尚未到达。
    pub fn from_request(id: RideId, driver_id: UserId, request: RideRequest) -> Self {
        Self {
            id,
            driver_id,
            rider_id: request.rider_id,
            pickup: request.pickup,
            destination: request.destination,
            destination_text: request.destination_text,
            requested_time: request.requested_time,
            chat: Vec::new(),
            arrived: false,
            cost: None,
        }
    }

    pub fn is_party(&self, user_id: UserId) -> bool {
        self.driver_id == user_id || self.rider_id == user_id
    }
}
