//! HTTP error mapping
//!
//! Every error leaves the API as `{"detail": "..."}`. Caller errors carry their
//! message; internal errors are logged in full and returned opaque.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{ErrorClass, FlightOnTimeError};

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// HTTP status for a terminal error class
#[must_use]
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Rejected => StatusCode::BAD_REQUEST,
        ErrorClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FlightOnTimeError> for ApiError {
    fn from(err: FlightOnTimeError) -> Self {
        let class = err.class();
        if class == ErrorClass::Failed {
            error!("Internal error while serving request: {:?}", err);
        }
        Self::new(status_for(class), err.user_message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        FlightOnTimeError::invalid_request(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(FlightOnTimeError::airport_not_found("ZZZ")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FlightOnTimeError::ModelUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(FlightOnTimeError::coercion("TAIL_NUM", "DL001")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_opaque() {
        let err = ApiError::from(FlightOnTimeError::coercion("TAIL_NUM", "DL001"));
        assert!(!err.detail.contains("TAIL_NUM"));
        assert!(!err.detail.contains("DL001"));
    }
}
