use async_trait::async_trait;
use domain::Coordinate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("address not found")]
    NotFound,
    #[error("geocoding failed: {0}")]
    Failed(String),
}

impl GeocodeError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 地址文本到坐标的解析端口。只在创建行程请求前使用。
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}
