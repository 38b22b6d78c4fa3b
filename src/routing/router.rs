//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the route descriptors in registration order
//! - Look up the first route matching a request's method and path
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan (the table is a dozen entries)
//! - No silent default: an unmatched request is a 404

use axum::http::Method;

use crate::routing::matcher::{method_matches, PathPattern, RouteParams};
use crate::routing::table::Route;

/// A route together with the parameters captured from the path.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: RouteParams,
}

/// Frozen, ordered route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Freeze a list of routes.
    ///
    /// An exact route registered after a wildcard that already covers it
    /// can never match; that is logged, not rejected.
    pub fn new(routes: Vec<Route>) -> Self {
        for (i, route) in routes.iter().enumerate() {
            let PathPattern::Exact(path) = &route.pattern else {
                continue;
            };
            let shadowed_by = routes[..i].iter().find(|earlier| {
                earlier.pattern.is_wildcard()
                    && earlier.method == route.method
                    && earlier.pattern.matches(path).is_some()
            });
            if let Some(earlier) = shadowed_by {
                tracing::warn!(route = route.name, shadowed_by = earlier.name, "Route can never match");
            }
        }

        tracing::debug!(routes = routes.len(), "Route table compiled");
        Self { routes }
    }

    /// First route (in registration order) matching the method and path.
    pub fn match_request(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            if !method_matches(&route.method, method) {
                return None;
            }
            route
                .pattern
                .matches(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
