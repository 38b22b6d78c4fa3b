//! `Cookie` header parsing.
//!
//! # Responsibilities
//! - Split the header into name/value pairs with the `cookie` crate
//! - Hold names and values to RFC 6265 syntax
//! - Apply the route's cookie mode to malformed pairs
//!
//! # Design Decisions
//! - Strict routes reject a malformed header outright
//! - Lenient routes log and drop the offending pairs
//! - Duplicate names: the first occurrence wins

use axum::http::{header, HeaderMap};
use cookie::Cookie;

use crate::error::SiteError;
use crate::routing::CookieMode;

/// Cookies sent with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse every `Cookie` header of a request according to `mode`.
    pub fn from_headers(headers: &HeaderMap, mode: CookieMode) -> Result<Self, SiteError> {
        let mut jar = CookieJar::default();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                match mode {
                    CookieMode::Strict => {
                        return Err(SiteError::InvalidCookie("non-ASCII header".into()))
                    }
                    CookieMode::Lenient => {
                        tracing::warn!("Ignoring non-ASCII cookie header");
                        continue;
                    }
                }
            };
            jar.parse_into(raw, mode)?;
        }
        Ok(jar)
    }

    /// Parse a single header value.
    pub fn parse(raw: &str, mode: CookieMode) -> Result<Self, SiteError> {
        let mut jar = CookieJar::default();
        jar.parse_into(raw, mode)?;
        Ok(jar)
    }

    fn parse_into(&mut self, raw: &str, mode: CookieMode) -> Result<(), SiteError> {
        for item in Cookie::split_parse(raw) {
            match item.map_err(|e| e.to_string()).and_then(well_formed) {
                Ok((name, value)) => {
                    if self.get(&name).is_none() {
                        self.pairs.push((name, value));
                    }
                }
                Err(reason) => match mode {
                    CookieMode::Strict => return Err(SiteError::InvalidCookie(reason)),
                    CookieMode::Lenient => {
                        tracing::warn!(reason = %reason, "Ignoring malformed cookie");
                    }
                },
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The parser accepts any name and value; hold both to RFC 6265.
fn well_formed(cookie: Cookie<'_>) -> Result<(String, String), String> {
    let name = cookie.name();
    let value = cookie.value_trimmed();
    if is_cookie_token(name) && value.bytes().all(is_cookie_octet) {
        Ok((name.to_string(), value.to_string()))
    } else {
        Err(cookie.to_string())
    }
}

/// RFC 7230 `token`: visible ASCII except separators.
pub fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}

/// RFC 6265 `cookie-octet`.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_pairs() {
        let jar = CookieJar::parse("crumb=abc123; theme=\"dark\"; empty=", CookieMode::Strict).unwrap();
        assert_eq!(jar.get("crumb"), Some("abc123"));
        assert_eq!(jar.get("theme"), Some("dark"));
        assert_eq!(jar.get("empty"), Some(""));
        assert_eq!(jar.get("missing"), None);
        assert_eq!(jar.len(), 3);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let jar = CookieJar::parse("a=1; a=2", CookieMode::Strict).unwrap();
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn test_strict_rejects_malformed() {
        for raw in ["novalue", "bad name=1", "a=has space", "a=\"unterminated", "=1", "a=x,y"] {
            let err = CookieJar::parse(raw, CookieMode::Strict).unwrap_err();
            assert!(matches!(err, SiteError::InvalidCookie(_)), "{raw}");
        }
    }

    #[test]
    fn test_strict_names_offending_pair() {
        let err = CookieJar::parse("a=b; bad\"name=1", CookieMode::Strict).unwrap_err();
        match err {
            SiteError::InvalidCookie(reason) => assert!(reason.contains("bad\"name"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_segments_ignored() {
        let jar = CookieJar::parse("a=1; ; b=2;", CookieMode::Strict).unwrap();
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_lenient_skips_malformed() {
        let jar = CookieJar::parse("good=1; novalue; a=has space; other=2", CookieMode::Lenient).unwrap();
        assert_eq!(jar.get("good"), Some("1"));
        assert_eq!(jar.get("other"), Some("2"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_from_headers_merges_multiple() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));
        let jar = CookieJar::from_headers(&headers, CookieMode::Strict).unwrap();
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("2"));

        assert!(CookieJar::from_headers(&HeaderMap::new(), CookieMode::Strict)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_cookie_token() {
        assert!(is_cookie_token("crumb"));
        assert!(is_cookie_token("__Host-id"));
        assert!(!is_cookie_token(""));
        assert!(!is_cookie_token("a b"));
        assert!(!is_cookie_token("a=b"));
    }
}
