//! Request identification and payload parsing.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Read it back for logging
//! - Parse form submissions (JSON or urlencoded) into a JSON object
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced

use axum::http::{header, HeaderMap, HeaderName, Request};
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::SiteError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// The request ID for logging, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Parse a form body into a JSON object.
///
/// `application/x-www-form-urlencoded` bodies become string fields;
/// anything else must be a JSON object. An empty body is an empty object.
pub fn parse_payload(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, SiteError> {
    if body.is_empty() {
        return Ok(Map::new());
    }

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        return Ok(url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SiteError::BadRequest("payload must be a JSON object".into())),
        Err(e) => Err(SiteError::BadRequest(format!("invalid JSON payload: {}", e))),
    }
}
