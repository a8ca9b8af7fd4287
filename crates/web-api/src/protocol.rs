//! 线上协议
//!
//! 双向都是 `{"event": <名称>, "data": <载荷>}` 的 JSON 帧。
//! 服务端事件由 `ServerEvent` 的序列化直接给出帧格式。

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use domain::{Coordinate, DomainError, RequestedTime, ServerEvent};

use application::ApplicationError;

/// 客户端帧：事件名加可选载荷。
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientFrame {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 把载荷解析成具体事件的数据结构。
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApplicationError> {
        serde_json::from_value(self.data.clone()).map_err(|err| {
            DomainError::invalid_argument(self.event.clone(), err.to_string()).into()
        })
    }
}

/// 乘客 join 的载荷。乘客 id 来自连接身份，不在载荷里。
#[derive(Debug, Deserialize)]
pub struct RiderJoinPayload {
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub destination_text: String,
    #[serde(default = "default_requested_time")]
    pub requested_time: RequestedTime,
    pub vehicle_class: String,
}

fn default_requested_time() -> RequestedTime {
    RequestedTime::Now
}

/// 司机 select 的载荷。
#[derive(Debug, Deserialize)]
pub struct SelectPayload {
    pub rider_id: Uuid,
    pub vehicle_class: String,
}

/// 行程/聊天频道 join 和 triggerarrived 的载荷。
#[derive(Debug, Deserialize)]
pub struct RideRefPayload {
    pub id: Uuid,
}

/// 聊天消息载荷。
#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub id: Uuid,
    pub message: String,
}

/// 守卫/授权失败只回报调用方，措辞沿用对外的提示文案。
pub fn failure_event(error: &ApplicationError) -> ServerEvent {
    let msg = match error {
        ApplicationError::Domain(DomainError::AlreadyInRide) => {
            "You are already in a ride!".to_owned()
        }
        ApplicationError::Domain(DomainError::Unauthorized)
        | ApplicationError::Domain(DomainError::NotFound { .. }) => "Invalid ride!".to_owned(),
        ApplicationError::Domain(err) => err.to_string(),
        _ => "Internal error".to_owned(),
    };
    ServerEvent::Failed { msg }
}
