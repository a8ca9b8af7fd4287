//! 主应用程序入口
//!
//! 加载配置、连接数据库、装配协调器并启动 Axum 服务。

use std::sync::Arc;

use application::{
    LocalBroadcastGateway, MatchingCoordinator, MatchingDependencies, Notifier, NoopNotifier,
    PendingRequestRegistry, RideSessionCoordinator, RideSessionDependencies, SessionDirectory,
    SystemClock,
};
use infrastructure::{create_pg_pool, NominatimGeocoder, PgRideStore, WebhookNotifier};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app_config = config::AppConfig::load()?;

    tracing::info!(
        "连接数据库: {}",
        app_config
            .database
            .url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let pg_pool = create_pg_pool(&app_config.database.url, app_config.database.max_connections)
        .await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 显式持有的共享状态，按引用传入协调器
    let registry = Arc::new(PendingRequestRegistry::new());
    let sessions = Arc::new(SessionDirectory::new());
    let gateway = Arc::new(LocalBroadcastGateway::new());
    let rides = Arc::new(PgRideStore::new(pg_pool));

    // 通知协作者：未配置回调地址时为空操作
    let notifier: Arc<dyn Notifier> = match &app_config.notifier.endpoint {
        Some(endpoint) => Arc::new(WebhookNotifier::new(endpoint.clone())),
        None => Arc::new(NoopNotifier),
    };

    let matching = Arc::new(MatchingCoordinator::new(MatchingDependencies {
        registry,
        sessions: sessions.clone(),
        rides: rides.clone(),
        clock: Arc::new(SystemClock),
    }));
    let ride_session = Arc::new(RideSessionCoordinator::new(RideSessionDependencies {
        sessions: sessions.clone(),
        rides: rides.clone(),
        notifier,
    }));

    let jwt_service = Arc::new(JwtService::new(app_config.jwt.clone()));
    let geocoder = Arc::new(NominatimGeocoder::new(app_config.geocoder.base_url.clone()));

    let state = AppState::new(
        matching,
        ride_session,
        gateway,
        sessions,
        rides,
        geocoder,
        jwt_service,
    );

    let app = router(state);
    let bind_addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("撮合服务器启动在 http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
