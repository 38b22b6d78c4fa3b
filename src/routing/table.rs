//! The site's route table.

use std::path::PathBuf;

use axum::http::Method;

use crate::routing::matcher::PathPattern;

/// How a route treats a malformed `Cookie` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieMode {
    /// Reject the request with 400.
    Strict,
    /// Log the bad pairs and carry on with the good ones.
    Lenient,
}

/// Static per-route settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    pub cookies: CookieMode,
    /// HSTS, X-Frame-Options and friends.
    pub security_headers: bool,
    /// Content-Security-Policy.
    pub csp: bool,
    /// Crumb cookie issued and checked on unsafe methods.
    pub csrf: bool,
}

impl RouteOptions {
    pub const fn strict() -> Self {
        Self {
            cookies: CookieMode::Strict,
            security_headers: false,
            csp: false,
            csrf: false,
        }
    }

    pub const fn lenient() -> Self {
        Self {
            cookies: CookieMode::Lenient,
            ..Self::strict()
        }
    }

    pub const fn secured(self) -> Self {
        Self {
            security_headers: true,
            ..self
        }
    }

    pub const fn with_csp(self) -> Self {
        Self { csp: true, ..self }
    }

    pub const fn with_csrf(self) -> Self {
        Self { csrf: true, ..self }
    }
}

/// API endpoints backed by code rather than files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEndpoint {
    Purge,
    MailingList,
    Crumb,
}

/// What a matched route does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Serve one file, relative to the static root.
    File(PathBuf),
    /// Serve the static root directory.
    Directory,
    /// Redirect to a fixed target, optionally followed by the wildcard tail.
    Redirect { target: String, append_tail: bool },
    /// Redirect to the download page for the client's platform.
    Download,
    /// Hand off to an API delegate.
    Api(ApiEndpoint),
}

/// One route descriptor.
#[derive(Debug, Clone)]
pub struct Route {
    /// Route identifier for logging/metrics.
    pub name: &'static str,
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: Handler,
    pub options: RouteOptions,
}

impl Route {
    pub fn new(
        name: &'static str,
        method: Method,
        pattern: &str,
        handler: Handler,
        options: RouteOptions,
    ) -> Self {
        Self {
            name,
            method,
            pattern: PathPattern::parse(pattern),
            handler,
            options,
        }
    }
}

/// Fixed pages and the files they are served from.
const PAGES: &[(&str, &str, &str)] = &[
    ("privacy_android", "/privacy_android", "android_privacy.html"),
    ("privacy_ios", "/privacy_ios", "ios_privacy.html"),
    ("terms_of_use", "/terms_of_use", "terms_of_use.html"),
    ("downloads", "/downloads", "downloads.html"),
];

/// The site's routes, in match order.
pub fn site_routes() -> Vec<Route> {
    let mut routes = vec![
        Route::new(
            "purge",
            Method::POST,
            "/api/purge",
            Handler::Api(ApiEndpoint::Purge),
            RouteOptions::strict(),
        ),
        Route::new(
            "mailchimp",
            Method::POST,
            "/api/mailchimp",
            Handler::Api(ApiEndpoint::MailingList),
            RouteOptions::lenient().secured().with_csrf(),
        ),
        Route::new(
            "crumb",
            Method::GET,
            "/api/crumb",
            Handler::Api(ApiEndpoint::Crumb),
            RouteOptions::lenient().secured().with_csrf(),
        ),
        Route::new(
            "download",
            Method::GET,
            "/api/download",
            Handler::Download,
            RouteOptions::lenient(),
        ),
        // Brave Combo, our favorite band.
        Route::new(
            "bo",
            Method::GET,
            "/bo/{path*}",
            Handler::Redirect {
                target: "http://bravecombo.com/".to_string(),
                append_tail: true,
            },
            RouteOptions::strict(),
        ),
    ];

    routes.extend(PAGES.iter().map(|(name, path, file)| {
        Route::new(
            name,
            Method::GET,
            path,
            Handler::File(PathBuf::from(file)),
            RouteOptions::lenient(),
        )
    }));

    routes.push(Route::new(
        "static",
        Method::GET,
        "/{path*}",
        Handler::Directory,
        RouteOptions::lenient().secured().with_csp(),
    ));

    routes
}
