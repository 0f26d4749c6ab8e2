use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

/// Error body in the shape the production API uses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: serde_json::Value,
    pub error: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SandboxError {
    #[error("{0:?}")]
    Validation(Vec<String>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
    #[error("status {0}")]
    Status(u16),
}

impl SandboxError {
    fn status(&self) -> StatusCode {
        match self {
            SandboxError::Validation(_) => StatusCode::BAD_REQUEST,
            SandboxError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SandboxError::NotFound(_) => StatusCode::NOT_FOUND,
            SandboxError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            SandboxError::Status(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn error_reply(status: StatusCode, message: serde_json::Value) -> Response {
    let body = ErrorBody {
        status_code: status.as_u16(),
        message,
        error: status.canonical_reason().unwrap_or("Error").to_string(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

impl Reply for SandboxError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            SandboxError::Validation(messages) => serde_json::json!(messages),
            SandboxError::Unauthorized(message) | SandboxError::NotFound(message) => {
                serde_json::json!(message)
            }
            SandboxError::Internal | SandboxError::Status(_) => {
                serde_json::json!("Internal server error")
            }
        };
        error_reply(status, message)
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl Reply, Infallible> {
    let reply = if err.is_not_found() {
        error_reply(StatusCode::NOT_FOUND, serde_json::json!("Cannot find route"))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        error_reply(StatusCode::BAD_REQUEST, serde_json::json!(e.to_string()))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            serde_json::json!("Method not allowed"),
        )
    } else {
        warn!("unhandled rejection: {:?}", err);
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!("Internal server error"),
        )
    };
    Ok(reply)
}
