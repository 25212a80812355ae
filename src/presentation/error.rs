// HTTP error responses
use crate::application::generator_controller::ControllerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Controller(ControllerError),
}

impl From<ControllerError> for AppError {
    fn from(err: ControllerError) -> Self {
        AppError::Controller(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Controller(err) => {
                let (status, code) = match &err {
                    ControllerError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
                    ControllerError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
                    ControllerError::Api { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}
