//! Fastly API client (purge only).

use async_trait::async_trait;
use thiserror::Error;

use super::CdnPurger;

/// Errors returned by the CDN.
#[derive(Debug, Error)]
pub enum CdnError {
    /// Fastly answered with a non-success status. The body is kept verbatim.
    #[error("{body}")]
    Rejected { status: u16, body: String },

    /// The request never completed.
    #[error("Fastly request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Purges a Fastly service through the REST API.
#[derive(Clone)]
pub struct FastlyClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl FastlyClient {
    pub fn new(client: reqwest::Client, api_base: &str, api_key: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn purge_all_url(&self, service_id: &str) -> String {
        format!("{}/service/{}/purge_all", self.api_base, service_id)
    }
}

#[async_trait]
impl CdnPurger for FastlyClient {
    async fn purge_all(&self, service_id: &str) -> Result<(), CdnError> {
        let resp = self
            .client
            .post(self.purge_all_url(service_id))
            .header("Fastly-Key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!(service_id = %service_id, "Fastly purge_all accepted");
            return Ok(());
        }

        let body = resp.text().await?;
        tracing::warn!(service_id = %service_id, status = %status, body = %body, "Fastly purge_all rejected");
        Err(CdnError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
