use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};
use crate::error::errors::Error;

/// Rewrites the bodies tower-http writes for rejected uploads and timed out
/// requests into the JSON error shape the handlers use.
pub async fn json_error_body_mw(response: Response) -> Response {
    let error = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => Error::payload_too_large(),
        StatusCode::REQUEST_TIMEOUT => Error::timeout(),
        _ => return response,
    };

    let mut json_response = error.into_response();
    for (name, value) in response.headers() {
        if *name == header::CONTENT_TYPE || *name == header::CONTENT_LENGTH || *name == header::CONTENT_ENCODING {
            continue
        }
        json_response.headers_mut().append(name.clone(), value.clone());
    }

    json_response
}
