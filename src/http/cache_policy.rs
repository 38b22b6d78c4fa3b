//! Cache headers for the CDN.
//!
//! Fastly serves all static content and only refreshes its edge caches on
//! an explicit purge. Every response leaves through this layer:
//!
//! | Response                     | cache-control | Surrogate-Control |
//! |------------------------------|---------------|-------------------|
//! | error (status >= 400)        | private       | private           |
//! | 404                          | 404 page, private, private        |
//! | non-GET                      | private       | private           |
//! | GET 200                      | public        | max-age=2592000   |
//! | other GET                    | unchanged (`no-cache` if unset)   |

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header read by Fastly and stripped before the browser sees it.
pub const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

/// How long the edge keeps a static object: 30 days.
pub const EDGE_MAX_AGE: &str = "max-age=2592000";

const FALLBACK_404: &str = "<!DOCTYPE html>\n<html><head><title>404 Not Found</title></head>\
<body><h1>Not Found</h1></body></html>\n";

/// What to do with a response's cache headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDirective {
    /// Never cache, anywhere.
    Private,
    /// Swap in the not-found page, then never cache.
    NotFoundPage,
    /// Cache at the edge until purged.
    Edge,
    /// Leave the handler's headers alone.
    Default,
}

/// Decide the directive for a response.
pub fn decide(method: &Method, status: StatusCode) -> CacheDirective {
    if status.is_client_error() || status.is_server_error() {
        if status == StatusCode::NOT_FOUND {
            CacheDirective::NotFoundPage
        } else {
            CacheDirective::Private
        }
    } else if method != Method::GET {
        CacheDirective::Private
    } else if status == StatusCode::OK {
        CacheDirective::Edge
    } else {
        CacheDirective::Default
    }
}

/// Write the cache headers for a directive.
pub fn apply_headers(directive: CacheDirective, headers: &mut HeaderMap) {
    match directive {
        CacheDirective::Private | CacheDirective::NotFoundPage => {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private"));
            headers.insert(SURROGATE_CONTROL, HeaderValue::from_static("private"));
        }
        CacheDirective::Edge => {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public"));
            headers.insert(SURROGATE_CONTROL, HeaderValue::from_static(EDGE_MAX_AGE));
        }
        CacheDirective::Default => {
            headers
                .entry(header::CACHE_CONTROL)
                .or_insert_with(|| HeaderValue::from_static("no-cache"));
        }
    }
}

/// The static page sent with every 404.
#[derive(Debug, Clone)]
pub struct NotFoundPage {
    path: PathBuf,
}

impl NotFoundPage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the page from disk; a built-in page stands in if it is missing.
    pub async fn render(&self) -> Response {
        let body = match tokio::fs::read(&self.path).await {
            Ok(bytes) => Body::from(bytes),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "404 page unavailable, using built-in page");
                Body::from(FALLBACK_404)
            }
        };
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

/// Middleware applying the policy to every response.
pub async fn cache_policy_middleware(
    State(not_found): State<Arc<NotFoundPage>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    let directive = decide(&method, response.status());
    let mut response = match directive {
        CacheDirective::NotFoundPage => {
            let mut page = not_found.render().await;
            carry_route_headers(response.headers(), page.headers_mut());
            page
        }
        _ => response,
    };
    apply_headers(directive, response.headers_mut());
    response
}

/// Copy the route's headers onto a replacement body. The page keeps its own
/// content headers.
fn carry_route_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for name in from.keys() {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        to.remove(name);
        for value in from.get_all(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_methods() -> Vec<Method> {
        vec![
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]
    }

    #[test]
    fn test_errors_are_private_for_every_method() {
        for method in all_methods() {
            for code in [400u16, 401, 403, 405, 408, 413, 429, 500, 502, 503] {
                let status = StatusCode::from_u16(code).unwrap();
                assert_eq!(decide(&method, status), CacheDirective::Private, "{method} {code}");
            }
            assert_eq!(
                decide(&method, StatusCode::NOT_FOUND),
                CacheDirective::NotFoundPage
            );
        }
    }

    #[test]
    fn test_get_ok_is_edge_cached() {
        assert_eq!(decide(&Method::GET, StatusCode::OK), CacheDirective::Edge);
    }

    #[test]
    fn test_non_get_success_is_private() {
        for method in all_methods().into_iter().filter(|m| m != Method::GET) {
            for status in [StatusCode::OK, StatusCode::CREATED, StatusCode::FOUND] {
                assert_eq!(decide(&method, status), CacheDirective::Private);
            }
        }
    }

    #[test]
    fn test_other_get_left_alone() {
        for status in [
            StatusCode::NO_CONTENT,
            StatusCode::PARTIAL_CONTENT,
            StatusCode::FOUND,
            StatusCode::TEMPORARY_REDIRECT,
            StatusCode::NOT_MODIFIED,
        ] {
            assert_eq!(decide(&Method::GET, status), CacheDirective::Default);
        }
    }

    #[test]
    fn test_apply_headers() {
        let mut headers = HeaderMap::new();
        apply_headers(CacheDirective::Edge, &mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], "public");
        assert_eq!(headers[SURROGATE_CONTROL], EDGE_MAX_AGE);

        apply_headers(CacheDirective::Private, &mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], "private");
        assert_eq!(headers[SURROGATE_CONTROL], "private");

        let mut headers = HeaderMap::new();
        apply_headers(CacheDirective::Default, &mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert!(!headers.contains_key(SURROGATE_CONTROL));

        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        apply_headers(CacheDirective::Default, &mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=60");
    }

    #[test]
    fn test_route_headers_carried_onto_page() {
        let mut route = HeaderMap::new();
        route.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        route.insert(header::CONTENT_LENGTH, HeaderValue::from_static("9"));
        route.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15768000"),
        );
        route.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        route.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let mut page = HeaderMap::new();
        page.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        carry_route_headers(&route, &mut page);

        assert_eq!(page[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert!(!page.contains_key(header::CONTENT_LENGTH));
        assert_eq!(page[header::STRICT_TRANSPORT_SECURITY], "max-age=15768000");
        assert_eq!(page.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn test_not_found_page_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("404.html");
        std::fs::write(&path, "<h1>lost</h1>").unwrap();

        let response = NotFoundPage::new(path).render().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>lost</h1>");
    }

    #[tokio::test]
    async fn test_not_found_page_fallback() {
        let response = NotFoundPage::new(PathBuf::from("/no/such/404.html")).render().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], FALLBACK_404.as_bytes());
    }
}
