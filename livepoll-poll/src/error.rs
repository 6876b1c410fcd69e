//! Error types for livepoll-poll
//!
//! Only dispatch problems are errors. Rejected votes are not; see
//! [`livepoll_common::VoteOutcome`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// `action` query parameter missing or not one of the known actions
    #[error("Unknown action")]
    UnknownAction,

    /// Request body present but not a JSON object
    #[error("Malformed payload")]
    MalformedPayload(#[source] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownAction => StatusCode::BAD_REQUEST,
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
