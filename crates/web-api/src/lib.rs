//! Web API 传输层
//!
//! WebSocket 三频道（撮合交换 / 行程 / 聊天）加只读 REST 端点。
//! 业务语义都在应用层协调器里，这里负责身份校验、帧解析和事件投递。

pub mod auth;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod websocket;
pub mod ws_connection;

pub use auth::{Claims, JwtService};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
