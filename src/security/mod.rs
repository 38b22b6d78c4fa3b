//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (CSRF-protected routes):
//!     → csrf.rs (issue crumb cookie, check crumb on unsafe methods)
//!     → Pass to handler
//!
//! Outgoing response:
//!     → headers.rs (HSTS, X-Frame-Options, CSP per route)
//! ```
//!
//! # Design Decisions
//! - Shared secrets (purge key, crumb) compared in constant time
//! - Fail closed: a missing or mismatched crumb rejects the request

pub mod csrf;
pub mod headers;

pub use csrf::{Crumb, CrumbGuard};
pub use headers::SecurityHeaders;

/// Compare two secrets without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(constant_time_eq(b"", b""));
    }
}
