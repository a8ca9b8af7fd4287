//! 房间寻址与服务端事件
//!
//! 房间没有独立存储，只是广播的寻址标签。协调器不直接碰传输层：
//! 每个操作返回一组出站效果，由传输层交给 BroadcastGateway 投递。

use std::fmt;

use serde::Serialize;

use crate::entities::ride_request::RideRequest;
use crate::value_objects::{RideId, UserId, VehicleClass};

/// 广播房间的寻址键。
///
/// 等待撮合的乘客在 `{user_id}-WAITING`，某车类的所有司机在
/// `{vehicle_class}-DECIDING`，行程/聊天频道直接以行程 id 为房间。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Waiting(UserId),
    Deciding(VehicleClass),
    Ride(RideId),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting(user_id) => write!(f, "{user_id}-WAITING"),
            Self::Deciding(class) => write!(f, "{class}-DECIDING"),
            Self::Ride(ride_id) => write!(f, "{ride_id}"),
        }
    }
}

/// 服务端推送事件。
///
/// 序列化即线上帧格式：`{"event": <名称>, "data": <载荷>}`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// 新的待撮合请求，推给对应车类的司机房间
    #[serde(rename = "giveride")]
    GiveRide(RideRequest),
    /// 撮合成功，推给乘客的等待房间
    #[serde(rename = "gotride")]
    GotRide { ride_id: RideId },
    /// 撮合成功后引导司机跳转到行程页
    #[serde(rename = "redirect")]
    Redirect { url: String },
    /// 提示房间成员重新拉取行程状态
    #[serde(rename = "refresh")]
    Refresh,
    /// 操作失败，仅回报调用方
    #[serde(rename = "Failed")]
    Failed { msg: String },
}

impl ServerEvent {
    /// 事件名，用于日志。
    pub fn name(&self) -> &'static str {
        match self {
            Self::GiveRide(_) => "giveride",
            Self::GotRide { .. } => "gotride",
            Self::Redirect { .. } => "redirect",
            Self::Refresh => "refresh",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// 协调器返回的出站效果。
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// 调用方的连接加入房间
    JoinRoom(RoomKey),
    /// 向房间内所有成员广播
    ToRoom(RoomKey, ServerEvent),
    /// 只发给调用方自己的连接
    ToCaller(ServerEvent),
}
