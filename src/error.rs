//! Request-level error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::{CdnError, MailingListError};

/// Errors a route can fail with. Each maps to a plain-text error response,
/// which the cache policy then marks private.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Invalid cookie header: {0}")]
    InvalidCookie(String),

    #[error("Missing or invalid crumb")]
    Csrf,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    Cdn(#[from] CdnError),

    #[error(transparent)]
    MailingList(#[from] MailingListError),
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::InvalidCookie(_) | SiteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SiteError::Csrf => StatusCode::FORBIDDEN,
            SiteError::NotFound => StatusCode::NOT_FOUND,
            SiteError::Cdn(_) => StatusCode::BAD_GATEWAY,
            SiteError::MailingList(e) => e.status(),
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

pub type SiteResult<T> = Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SiteError::Csrf.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            SiteError::InvalidCookie("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SiteError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            SiteError::Cdn(CdnError::Rejected {
                status: 401,
                body: "denied".into()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            SiteError::MailingList(MailingListError::MissingEmail).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_cdn_error_surfaces_verbatim() {
        let err = SiteError::Cdn(CdnError::Rejected {
            status: 401,
            body: "{\"msg\":\"Provided credentials are missing or invalid\"}".into(),
        });
        assert_eq!(
            err.to_string(),
            "{\"msg\":\"Provided credentials are missing or invalid\"}"
        );
    }
}
