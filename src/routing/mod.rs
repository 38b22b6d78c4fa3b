//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup, registration order)
//!     → matcher.rs (evaluate path patterns)
//!     → Return: matched Route + params, or NoMatch
//!
//! Route Compilation (at startup):
//!     table.rs site_routes()
//!     → Router::new (freeze, warn on shadowed routes)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - First match wins; exact paths are registered before the catch-all
//! - user_agent.rs computes the `/api/download` redirect target

pub mod matcher;
pub mod router;
pub mod table;
pub mod user_agent;

pub use matcher::{PathPattern, RouteParams};
pub use router::{RouteMatch, Router};
pub use table::{site_routes, ApiEndpoint, CookieMode, Handler, Route, RouteOptions};
pub use user_agent::{DownloadTarget, UserAgentClassifier};
