use domain::DomainError;
use thiserror::Error;

use crate::broadcaster::BroadcastError;
use crate::repository::RideStoreError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("ride store error: {0}")]
    Store(#[from] RideStoreError),
    #[error("broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),
}

impl ApplicationError {
    /// 是否是只需回报调用方的守卫/授权类失败
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}
