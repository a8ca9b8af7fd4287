use application::{ApplicationError, GeocodeError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use domain::DomainError;

        match error {
            ApplicationError::Domain(DomainError::Unauthorized) => {
                ApiError::forbidden("not a party to this ride")
            }
            ApplicationError::Domain(DomainError::AlreadyInRide) => {
                ApiError::conflict("ALREADY_IN_RIDE", "You are already in a ride!")
            }
            ApplicationError::Domain(DomainError::AlreadyQueued) => {
                ApiError::conflict("ALREADY_QUEUED", "a ride request is already pending")
            }
            ApplicationError::Domain(DomainError::AlreadyArrived) => {
                ApiError::conflict("ALREADY_ARRIVED", "ride already arrived")
            }
            ApplicationError::Domain(DomainError::NotFound { resource }) => {
                ApiError::not_found(format!("{resource} not found"))
            }
            ApplicationError::Domain(
                DomainError::InvalidArgument { .. } | DomainError::InvalidState { .. },
            ) => ApiError::bad_request(error.to_string()),
            ApplicationError::Store(err) => {
                tracing::error!(error = %err, "ride store failure");
                ApiError::internal_server_error("storage failure")
            }
            ApplicationError::Broadcast(err) => {
                tracing::error!(error = %err, "broadcast failure");
                ApiError::internal_server_error("broadcast failure")
            }
        }
    }
}

impl From<GeocodeError> for ApiError {
    fn from(error: GeocodeError) -> Self {
        match error {
            GeocodeError::NotFound => ApiError::not_found("Invalid address!"),
            GeocodeError::Failed(message) => {
                tracing::warn!(error = %message, "geocoding failed");
                ApiError::new(StatusCode::BAD_GATEWAY, "GEOCODING_FAILED", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
