//! Security response headers.
//!
//! # Responsibilities
//! - Build the HSTS / frame / sniffing headers once at startup
//! - Build the Content-Security-Policy for the static site
//! - Stamp them onto responses of routes that ask for them
//!
//! # Design Decisions
//! - A header whose configured value is invalid is logged and left out;
//!   startup continues
//! - Headers already set by a handler are not overwritten

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::SecurityConfig;
use crate::routing::RouteOptions;

/// Prebuilt security headers.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    standard: HeaderMap,
    csp: Option<HeaderValue>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        let mut standard = HeaderMap::new();

        let mut hsts = format!("max-age={}", config.hsts_max_age);
        if config.hsts_include_subdomains {
            hsts.push_str("; includeSubDomains");
        }
        if config.hsts_preload {
            hsts.push_str("; preload");
        }
        insert_checked(&mut standard, header::STRICT_TRANSPORT_SECURITY, &hsts);
        standard.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        standard.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
        standard.insert(
            HeaderName::from_static("x-download-options"),
            HeaderValue::from_static("noopen"),
        );
        standard.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

        let csp = content_security_policy(config);

        Self { standard, csp }
    }

    /// Add the headers `options` asks for.
    pub fn apply(&self, options: &RouteOptions, headers: &mut HeaderMap) {
        if options.security_headers {
            for (name, value) in &self.standard {
                if !headers.contains_key(name) {
                    headers.insert(name.clone(), value.clone());
                }
            }
        }
        if options.csp {
            if let Some(csp) = &self.csp {
                headers
                    .entry(header::CONTENT_SECURITY_POLICY)
                    .or_insert_with(|| csp.clone());
            }
        }
    }
}

fn insert_checked(map: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            map.insert(name, v);
        }
        Err(e) => tracing::error!(header = %name, error = %e, "Skipping invalid security header"),
    }
}

fn content_security_policy(config: &SecurityConfig) -> Option<HeaderValue> {
    if config.content_security_policy.is_empty() {
        return None;
    }
    let policy = config
        .content_security_policy
        .iter()
        .map(|(directive, sources)| format!("{} {}", directive, sources.trim()))
        .collect::<Vec<_>>()
        .join("; ");

    match HeaderValue::from_str(&policy) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!(error = %e, "Content-Security-Policy is not a valid header value; not sending it");
            None
        }
    }
}
