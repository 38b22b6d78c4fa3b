//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns (`/api/purge`, `/bo/{path*}`, `/{path*}`)
//! - Match request paths, capturing the wildcard tail
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A wildcard tail may be empty: `/bo/{path*}` matches `/bo` and `/bo/`
//! - No regex to guarantee O(n) matching

use axum::http::Method;

/// Parameters captured by a matched pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    /// Wildcard tail without its leading slash, if the pattern has one.
    pub tail: Option<String>,
}

/// A compiled route path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches `prefix` itself and every path below `prefix/`.
    /// The prefix has no trailing slash; the root wildcard has prefix `""`.
    Wildcard { prefix: String, name: String },
}

impl PathPattern {
    /// Parse a pattern. A final `{name*}` segment makes it a wildcard.
    pub fn parse(pattern: &str) -> Self {
        if let Some((prefix, last)) = pattern.rsplit_once('/') {
            if let Some(name) = last
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix("*}"))
            {
                return PathPattern::Wildcard {
                    prefix: prefix.to_string(),
                    name: name.to_string(),
                };
            }
        }
        PathPattern::Exact(pattern.to_string())
    }

    /// Match a request path, returning captured parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        match self {
            PathPattern::Exact(expected) => (path == expected).then(RouteParams::default),
            PathPattern::Wildcard { prefix, .. } => {
                if path == prefix {
                    return Some(RouteParams {
                        tail: Some(String::new()),
                    });
                }
                let rest = path.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
                Some(RouteParams {
                    tail: Some(rest.to_string()),
                })
            }
        }
    }

    /// Exact patterns sort before wildcards when checking table order.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PathPattern::Wildcard { .. })
    }
}

/// Whether a route registered for `route_method` serves `method`.
/// `HEAD` is answered by `GET` routes.
pub fn method_matches(route_method: &Method, method: &Method) -> bool {
    route_method == method || (*route_method == Method::GET && *method == Method::HEAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            PathPattern::parse("/api/purge"),
            PathPattern::Exact("/api/purge".into())
        );
        assert_eq!(
            PathPattern::parse("/bo/{path*}"),
            PathPattern::Wildcard {
                prefix: "/bo".into(),
                name: "path".into()
            }
        );
        assert_eq!(
            PathPattern::parse("/{path*}"),
            PathPattern::Wildcard {
                prefix: "".into(),
                name: "path".into()
            }
        );
    }

    #[test]
    fn test_exact_match() {
        let p = PathPattern::parse("/downloads");
        assert_eq!(p.matches("/downloads"), Some(RouteParams::default()));
        assert_eq!(p.matches("/downloads/"), None);
        assert_eq!(p.matches("/Downloads"), None);
    }

    #[test]
    fn test_wildcard_match() {
        let p = PathPattern::parse("/bo/{path*}");
        let tail = |path: &str| p.matches(path).and_then(|m| m.tail);

        assert_eq!(tail("/bo/foo/bar").as_deref(), Some("foo/bar"));
        assert_eq!(tail("/bo/").as_deref(), Some(""));
        assert_eq!(tail("/bo").as_deref(), Some(""));
        assert_eq!(tail("/bogus"), None);
        assert_eq!(tail("/other/bo/x"), None);
    }

    #[test]
    fn test_root_wildcard_matches_everything() {
        let p = PathPattern::parse("/{path*}");
        assert_eq!(p.matches("/").unwrap().tail.as_deref(), Some(""));
        assert_eq!(
            p.matches("/css/site.css").unwrap().tail.as_deref(),
            Some("css/site.css")
        );
    }

    #[test]
    fn test_method_matches() {
        assert!(method_matches(&Method::GET, &Method::GET));
        assert!(method_matches(&Method::GET, &Method::HEAD));
        assert!(!method_matches(&Method::POST, &Method::GET));
        assert!(!method_matches(&Method::HEAD, &Method::GET));
    }
}
