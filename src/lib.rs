//! Marketing site web server library.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::SiteConfig;
pub use error::{SiteError, SiteResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
