//! 待撮合的行程请求
//!
//! 乘客发出 join 时创建；被取消或被选中时移除，此外从不修改。
//! 生命周期内由 PendingRequestRegistry 独占持有。

use serde::{Deserialize, Serialize};

use crate::value_objects::{Coordinate, RequestedTime, UserId, VehicleClass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub rider_id: UserId,
    pub vehicle_class: VehicleClass,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub destination_text: String,
    pub requested_time: RequestedTime,
}
