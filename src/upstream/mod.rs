//! Third-party APIs the site talks to.
//!
//! # Data Flow
//! ```text
//! /api/purge     → CdnPurger    (fastly.rs)    → api.fastly.com
//! /api/mailchimp → MailingList  (mailchimp.rs) → <dc>.api.mailchimp.com
//! ```
//!
//! # Design Decisions
//! - Each API sits behind an object-safe trait so handlers can be tested
//!   without network access
//! - One shared `reqwest::Client` (connection pool, upstream timeout)
//! - No retries: a failed call fails the request

pub mod fastly;
pub mod mailchimp;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

pub use fastly::{CdnError, FastlyClient};
pub use mailchimp::{MailchimpClient, MailingListError};

/// Purges every cached object of a CDN service.
#[async_trait]
pub trait CdnPurger: Send + Sync {
    async fn purge_all(&self, service_id: &str) -> Result<(), CdnError>;
}

/// Adds a subscriber to the mailing list.
#[async_trait]
pub trait MailingList: Send + Sync {
    async fn subscribe(&self, payload: Map<String, Value>) -> Result<UpstreamReply, MailingListError>;
}

/// An upstream HTTP reply, passed back to the client unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamReply {
    pub async fn from_response(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        Ok(Self {
            status,
            content_type,
            body,
        })
    }
}

/// Build the HTTP client shared by all upstream APIs.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("site-server/", env!("CARGO_PKG_VERSION")))
        .build()
}
