//! 集成测试支撑：内存依赖 + 真实监听端口

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use application::geocoder::{GeocodeError, Geocoder};
use application::notifier::NoopNotifier;
use application::repository::memory::MemoryRideStore;
use application::{
    LocalBroadcastGateway, MatchingCoordinator, MatchingDependencies, PendingRequestRegistry,
    RideSessionCoordinator, RideSessionDependencies, SessionDirectory, SystemClock,
};
use config::JwtConfig;
use domain::{Coordinate, Identity};
use web_api::{router, AppState, JwtService};

/// 固定坐标的地理编码桩
pub struct StubGeocoder;

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        if address == "nowhere at all" {
            return Err(GeocodeError::NotFound);
        }
        Ok(Coordinate::new(48.8556, 2.2986))
    }
}

pub struct TestApp {
    pub base_http: String,
    pub base_ws: String,
    pub jwt: Arc<JwtService>,
    pub rides: Arc<MemoryRideStore>,
    _shutdown: oneshot::Sender<()>,
}

impl TestApp {
    pub fn token_for(&self, identity: &Identity) -> String {
        self.jwt.generate_token(identity).expect("generate token")
    }
}

pub async fn spawn_app() -> TestApp {
    let registry = Arc::new(PendingRequestRegistry::new());
    let sessions = Arc::new(SessionDirectory::new());
    let rides = Arc::new(MemoryRideStore::new());
    let gateway = Arc::new(LocalBroadcastGateway::new());
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "integration-test-secret".into(),
        expiration_hours: 1,
    }));

    let matching = Arc::new(MatchingCoordinator::new(MatchingDependencies {
        registry,
        sessions: sessions.clone(),
        rides: rides.clone(),
        clock: Arc::new(SystemClock),
    }));
    let ride_session = Arc::new(RideSessionCoordinator::new(RideSessionDependencies {
        sessions: sessions.clone(),
        rides: rides.clone(),
        notifier: Arc::new(NoopNotifier),
    }));

    let state = AppState::new(
        matching,
        ride_session,
        gateway,
        sessions,
        rides.clone(),
        Arc::new(StubGeocoder),
        jwt.clone(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestApp {
        base_http: format!("http://{addr}"),
        base_ws: format!("ws://{addr}"),
        jwt,
        rides,
        _shutdown: shutdown_tx,
    }
}
