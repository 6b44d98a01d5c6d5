use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

/// Body of every non-2XX response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            // 4XX Errors
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            // 5XX Errors
            Error::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing_image() -> Self {
        Error::BadRequest("No image data provided".to_string())
    }

    pub fn no_face() -> Self {
        Error::BadRequest("No face detected in the image".to_string())
    }

    pub fn timeout() -> Self {
        Error::Timeout("Request timed out".to_string())
    }

    pub fn payload_too_large() -> Self {
        Error::PayloadTooLarge("Request body too large".to_string())
    }

    pub fn server(e: impl std::fmt::Display) -> Self {
        Error::Server(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let body = Json(ErrorBody { error: self.to_string() });

        (status_code, body).into_response()
    }
}
