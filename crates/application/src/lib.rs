//! 应用层
//!
//! 撮合与行程会话的核心：内存中的待撮合队列、会话目录、广播网关抽象，
//! 以及两个协调器。对外部协作者（行程存储、通知、地理编码、时钟）只依赖端口。

pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod geocoder;
pub mod local_broadcast;
pub mod notifier;
pub mod registry;
pub mod repository;
pub mod services;
pub mod sessions;

pub use broadcaster::{BroadcastError, BroadcastGateway};
pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use geocoder::{GeocodeError, Geocoder};
pub use local_broadcast::LocalBroadcastGateway;
pub use notifier::{NoopNotifier, Notifier, NotifyError};
pub use registry::PendingRequestRegistry;
pub use repository::{RideStore, RideStoreError};
pub use services::{
    MatchingCoordinator, MatchingDependencies, RideIntent, RideSessionCoordinator,
    RideSessionDependencies,
};
pub use sessions::{Channel, SessionDirectory};
