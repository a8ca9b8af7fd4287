//! 调用方身份
//!
//! 上游身份提供方给出的只读投影。角色用标签变体表达，所有角色判断
//! 都是变体匹配。

use serde::{Deserialize, Serialize};

use crate::value_objects::{UserId, VehicleClass};

/// 参与方角色。聊天记录里的 sender 也用这个类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
}

/// 已认证调用方的身份投影。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Rider { id: UserId },
    Driver { id: UserId, vehicle_class: VehicleClass },
}

impl Identity {
    pub fn rider(id: UserId) -> Self {
        Self::Rider { id }
    }

    pub fn driver(id: UserId, vehicle_class: VehicleClass) -> Self {
        Self::Driver { id, vehicle_class }
    }

    pub fn id(&self) -> UserId {
        match self {
            Self::Rider { id } | Self::Driver { id, .. } => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Rider { .. } => Role::Rider,
            Self::Driver { .. } => Role::Driver,
        }
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    /// 司机的车辆类别；乘客没有。
    pub fn vehicle_class(&self) -> Option<&VehicleClass> {
        match self {
            Self::Driver { vehicle_class, .. } => Some(vehicle_class),
            Self::Rider { .. } => None,
        }
    }
}
