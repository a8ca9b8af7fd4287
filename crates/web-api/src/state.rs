use std::sync::Arc;

use application::{
    Geocoder, LocalBroadcastGateway, MatchingCoordinator, RideSessionCoordinator, RideStore,
    SessionDirectory,
};

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub matching: Arc<MatchingCoordinator>,
    pub ride_session: Arc<RideSessionCoordinator>,
    pub gateway: Arc<LocalBroadcastGateway>,
    pub sessions: Arc<SessionDirectory>,
    pub rides: Arc<dyn RideStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        matching: Arc<MatchingCoordinator>,
        ride_session: Arc<RideSessionCoordinator>,
        gateway: Arc<LocalBroadcastGateway>,
        sessions: Arc<SessionDirectory>,
        rides: Arc<dyn RideStore>,
        geocoder: Arc<dyn Geocoder>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            matching,
            ride_session,
            gateway,
            sessions,
            rides,
            geocoder,
            jwt_service,
        }
    }
}
