use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use domain::{ChatEntry, Coordinate, Identity, RequestedTime, Ride, RideId};

use crate::{error::ApiError, state::AppState, websocket};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/exchange", get(websocket::exchange))
        .route("/ws/ride", get(websocket::ride))
        .route("/ws/chat", get(websocket::chat))
        .route("/rides/{ride_id}", get(ride_details))
        .route("/rides/{ride_id}/chat", get(ride_chat))
        .route("/rides/{ride_id}/invoice", get(ride_invoice))
        .route("/geocode", get(geocode))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct RideResponse {
    id: RideId,
    driver_id: Uuid,
    rider_id: Uuid,
    pickup: Coordinate,
    destination: Coordinate,
    destination_text: String,
    requested_time: RequestedTime,
    arrived: bool,
    /// 行程已到达时客户端应转向发票视图
    invoice_ready: bool,
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        Self {
            id: ride.id,
            driver_id: ride.driver_id.into(),
            rider_id: ride.rider_id.into(),
            pickup: ride.pickup,
            destination: ride.destination,
            destination_text: ride.destination_text,
            requested_time: ride.requested_time,
            arrived: ride.arrived,
            invoice_ready: ride.arrived,
        }
    }
}

/// 行程必须存在且调用方是参与者。
async fn authorized_ride(
    state: &AppState,
    headers: &HeaderMap,
    ride_id: Uuid,
) -> Result<(Ride, Identity), ApiError> {
    let identity = state.jwt_service.identity_from_headers(headers)?;
    let ride = state
        .rides
        .get(RideId::new(ride_id))
        .await
        .map_err(|err| ApiError::from(application::ApplicationError::from(err)))?
        .ok_or_else(|| ApiError::not_found("ride not found"))?;
    if !ride.is_party(identity.id()) {
        return Err(ApiError::forbidden("not a party to this ride"));
    }
    Ok((ride, identity))
}

async fn ride_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideResponse>, ApiError> {
    let (ride, _) = authorized_ride(&state, &headers, ride_id).await?;
    Ok(Json(ride.into()))
}

async fn ride_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<Vec<ChatEntry>>, ApiError> {
    let (ride, _) = authorized_ride(&state, &headers, ride_id).await?;
    Ok(Json(ride.chat))
}

#[derive(Debug, Serialize)]
struct InvoiceResponse {
    ride_id: RideId,
    cost: i64,
}

async fn ride_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let (ride, _) = authorized_ride(&state, &headers, ride_id).await?;
    // 到达前没有发票
    let cost = ride
        .cost
        .filter(|_| ride.arrived)
        .ok_or_else(|| ApiError::conflict("NOT_ARRIVED", "ride has not arrived yet"))?;
    Ok(Json(InvoiceResponse {
        ride_id: ride.id,
        cost,
    }))
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    q: String,
}

/// 地址文本解析，客户端在发起 join 之前调用。
async fn geocode(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Coordinate>, ApiError> {
    state.jwt_service.identity_from_headers(&headers)?;
    let coordinate = state.geocoder.resolve(&query.q).await?;
    Ok(Json(coordinate))
}
