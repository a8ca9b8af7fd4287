//! 领域模型
//!
//! 定义叫车撮合系统的核心类型：值对象、实体、房间事件和错误分类。
//! 该层不做任何 I/O。

pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use entities::identity::{Identity, Role};
pub use entities::ride::{ChatEntry, Ride};
pub use entities::ride_request::RideRequest;
pub use errors::{DomainError, DomainResult};
pub use events::{Outbound, RoomKey, ServerEvent};
pub use value_objects::{ConnectionId, Coordinate, RequestedTime, RideId, UserId, VehicleClass};
