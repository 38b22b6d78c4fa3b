//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the site server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Static asset locations.
    pub static_files: StaticFilesConfig,

    /// CDN (Fastly) purge credentials.
    pub cdn: CdnConfig,

    /// Mailing list (Mailchimp) credentials.
    pub mailing_list: MailingListConfig,

    /// Security header settings.
    pub security: SecurityConfig,

    /// CSRF crumb settings.
    pub csrf: CsrfConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl SiteConfig {
    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by `PORT`.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served by the catch-all route.
    pub root: PathBuf,

    /// Page served (relative to `root`) for every 404.
    pub not_found_page: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public"),
            not_found_page: "404.html".to_string(),
        }
    }
}

impl StaticFilesConfig {
    pub fn not_found_path(&self) -> PathBuf {
        self.root.join(&self.not_found_page)
    }
}

/// Fastly purge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CdnConfig {
    /// Fastly API key. Also the shared secret expected by `/api/purge`.
    pub api_key: String,

    /// Fastly service whose cache is purged.
    pub service_id: String,

    /// Fastly API base URL.
    pub api_base: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            service_id: String::new(),
            api_base: "https://api.fastly.com".to_string(),
        }
    }
}

/// Mailchimp configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailingListConfig {
    /// Mailchimp API key, including the datacenter suffix (`<key>-us6`).
    pub api_key: String,

    /// Audience (list) id new members are added to.
    pub list_id: String,

    /// Explicit API base URL. Derived from the key's datacenter when unset.
    pub api_base: Option<String>,

    /// Send a confirmation mail before subscribing.
    pub double_opt_in: bool,
}

impl Default for MailingListConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            list_id: String::new(),
            api_base: None,
            double_opt_in: true,
        }
    }
}

impl MailingListConfig {
    /// Datacenter suffix of the API key (`us6` in `abc123-us6`).
    pub fn datacenter(&self) -> Option<&str> {
        self.api_key
            .rsplit_once('-')
            .map(|(_, dc)| dc)
            .filter(|dc| !dc.is_empty())
    }

    /// API base URL, explicit or derived from the datacenter.
    pub fn resolved_api_base(&self) -> Option<String> {
        match &self.api_base {
            Some(base) => Some(base.trim_end_matches('/').to_string()),
            None => self
                .datacenter()
                .map(|dc| format!("https://{}.api.mailchimp.com/3.0", dc)),
        }
    }
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HSTS max-age in seconds.
    pub hsts_max_age: u64,

    /// Add `includeSubDomains` to HSTS.
    pub hsts_include_subdomains: bool,

    /// Add `preload` to HSTS.
    pub hsts_preload: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Content-Security-Policy directives for the static site.
    pub content_security_policy: BTreeMap<String, String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let content_security_policy = [
            ("default-src", "'self'"),
            ("font-src", "https://fonts.gstatic.com data: 'self'"),
            (
                "frame-ancestors",
                "chrome-extension://mnojpmjdmbbfmejpflffifhffcmidifd",
            ),
            ("frame-src", "*.greenhouse.io"),
            ("img-src", "*.brave.com *.greenhouse.io 'self'"),
            ("script-src", "'unsafe-inline' *.brave.com *.greenhouse.io 'self'"),
            (
                "style-src",
                "'unsafe-inline' https://fonts.googleapis.com/ 'self'",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            hsts_max_age: 31_536_000,
            hsts_include_subdomains: true,
            hsts_preload: true,
            max_body_size: 64 * 1024,
            content_security_policy,
        }
    }
}

/// CSRF crumb configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Cookie holding the crumb.
    pub cookie_name: String,

    /// Header a client may submit the crumb in.
    pub header_name: String,

    /// Generated token length.
    pub token_length: usize,

    /// Mark the cookie `Secure`.
    pub secure_cookie: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: "crumb".to_string(),
            header_name: "x-csrf-token".to_string(),
            token_length: 43,
            secure_cookie: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for calls to Fastly and Mailchimp in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
