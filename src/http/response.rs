//! Handler results and their conversion into responses.
//!
//! # Responsibilities
//! - Give every handler kind one result type (`Reply`)
//! - Turn a reply into a response: stream files, build redirects, encode JSON
//!
//! # Design Decisions
//! - File transfer (ranges, conditional GET, content types, traversal checks)
//!   is left to `tower_http::services`
//! - Redirects are `302 Found`
//! - Cache headers are not set here; the cache policy layer owns them

use std::convert::Infallible;
use std::path::PathBuf;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::SiteError;

/// What a route handler produced.
pub enum Reply {
    /// Stream one file.
    File(PathBuf),
    /// Serve the request path out of a directory.
    Directory(PathBuf),
    /// `302 Found` to the target.
    Redirect(String),
    /// JSON document with status 200.
    Json(serde_json::Value),
    /// Plain text with a status.
    Text(StatusCode, String),
    /// A response built by an API delegate.
    Delegate(Response),
}

impl Reply {
    /// Produce the response. File replies need the original request for
    /// its path, range and conditional headers.
    pub async fn into_response(self, request: Request<Body>) -> Response {
        match self {
            Reply::File(path) => serve(ServeFile::new(path), request).await,
            Reply::Directory(root) => serve(ServeDir::new(root), request).await,
            Reply::Redirect(target) => match HeaderValue::try_from(target.as_str()) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                Err(_) => SiteError::BadRequest(format!("unusable redirect target: {}", target))
                    .into_response(),
            },
            Reply::Json(value) => Json(value).into_response(),
            Reply::Text(status, text) => (status, text).into_response(),
            Reply::Delegate(response) => response,
        }
    }
}

async fn serve<S, B>(service: S, request: Request<Body>) -> Response
where
    S: tower::Service<Request<Body>, Response = axum::http::Response<B>, Error = Infallible>,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    match service.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
