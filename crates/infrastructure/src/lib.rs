//! 基础设施适配器
//!
//! 应用层端口的具体实现：Postgres 行程存储、Nominatim 地理编码、
//! Webhook 通知。

pub mod geocode;
pub mod notify;
pub mod pg_ride_store;

pub use geocode::NominatimGeocoder;
pub use notify::WebhookNotifier;
pub use pg_ride_store::{create_pg_pool, PgRideStore};
