//! `GET /api/crumb`: echo the request's cookies so the page script can
//! read its crumb.

use axum::http::{header, HeaderMap};
use serde::Serialize;

use crate::http::response::Reply;

#[derive(Debug, Serialize)]
pub struct CookieEcho {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

pub fn echo_cookie(headers: &HeaderMap) -> Reply {
    let echo = CookieEcho {
        cookie: headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    Reply::Json(serde_json::to_value(echo).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json(reply: Reply) -> serde_json::Value {
        match reply {
            Reply::Json(v) => v,
            _ => panic!("expected JSON reply"),
        }
    }

    #[test]
    fn test_echoes_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("crumb=abc; theme=dark"));
        assert_eq!(
            json(echo_cookie(&headers)),
            serde_json::json!({"cookie": "crumb=abc; theme=dark"})
        );
    }

    #[test]
    fn test_no_cookie_is_empty_object() {
        assert_eq!(json(echo_cookie(&HeaderMap::new())), serde_json::json!({}));
    }
}
