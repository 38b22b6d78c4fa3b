//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, payload parsing)
//!     → cookies.rs (per-route strict/lenient parsing)
//!     → [routing layer picks the route] → handler / API delegate
//!     → response.rs (files, redirects, JSON)
//!     → cache_policy.rs (cache headers, 404 page)
//!     → Send to client
//! ```

pub mod cache_policy;
pub mod cookies;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, SiteState};
