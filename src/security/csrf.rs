//! CSRF crumb (double-submit cookie).
//!
//! # Responsibilities
//! - Issue a random crumb cookie to clients that lack a valid one
//! - On unsafe methods, require the crumb back in a header or form field
//!
//! # Design Decisions
//! - The crumb is stateless: the cookie is the only copy
//! - A malformed cookie crumb is replaced, never trusted
//! - Comparison is constant time

use axum::http::{header::InvalidHeaderName, HeaderMap, HeaderName, HeaderValue, Method};
use cookie::{Cookie, SameSite};
use rand::{distributions::Alphanumeric, Rng};

use crate::config::CsrfConfig;
use crate::error::SiteError;
use crate::http::cookies::CookieJar;
use crate::security::constant_time_eq;

/// Payload field a form may carry the crumb in.
pub const CRUMB_FIELD: &str = "crumb";

/// The crumb in effect for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub token: String,
    /// True when the token was minted for this request and must be set as a cookie.
    pub fresh: bool,
}

/// Issues and checks crumbs.
#[derive(Debug, Clone)]
pub struct CrumbGuard {
    cookie_name: String,
    header_name: HeaderName,
    token_length: usize,
    secure: bool,
}

impl CrumbGuard {
    pub fn new(config: &CsrfConfig) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            cookie_name: config.cookie_name.clone(),
            header_name: HeaderName::try_from(config.header_name.as_str())?,
            token_length: config.token_length,
            secure: config.secure_cookie,
        })
    }

    pub fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.token_length)
            .map(char::from)
            .collect()
    }

    fn is_well_formed(&self, token: &str) -> bool {
        token.len() == self.token_length && token.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    /// Reuse the client's crumb cookie, or mint a new crumb.
    pub fn crumb_for(&self, jar: &CookieJar) -> Crumb {
        match jar.get(&self.cookie_name) {
            Some(token) if self.is_well_formed(token) => Crumb {
                token: token.to_string(),
                fresh: false,
            },
            Some(_) => {
                tracing::debug!(cookie = %self.cookie_name, "Replacing malformed crumb cookie");
                self.fresh_crumb()
            }
            None => self.fresh_crumb(),
        }
    }

    fn fresh_crumb(&self) -> Crumb {
        Crumb {
            token: self.generate(),
            fresh: true,
        }
    }

    /// `Set-Cookie` value carrying a crumb.
    pub fn set_cookie(&self, token: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        let cookie = Cookie::build((self.cookie_name.as_str(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .build();
        HeaderValue::from_str(&cookie.to_string())
    }

    /// Crumb submitted in the request header, if any.
    pub fn header_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers.get(&self.header_name).and_then(|v| v.to_str().ok())
    }

    /// Methods that must prove they hold the crumb.
    pub fn requires_check(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Check a submitted crumb against the request's crumb.
    ///
    /// A freshly minted crumb never verifies: the client cannot know it yet.
    pub fn verify(&self, crumb: &Crumb, submitted: Option<&str>) -> Result<(), SiteError> {
        match submitted {
            Some(token) if !crumb.fresh && constant_time_eq(token.as_bytes(), crumb.token.as_bytes()) => Ok(()),
            _ => {
                tracing::warn!(fresh = crumb.fresh, submitted = submitted.is_some(), "Crumb check failed");
                Err(SiteError::Csrf)
            }
        }
    }
}
