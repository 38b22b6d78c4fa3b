//! `POST /api/purge?fastly_api_key=...`
//!
//! The query key doubles as the credential: it must equal the configured
//! Fastly API key. Anything else gets the same `bad api key` reply.

use axum::http::StatusCode;

use crate::config::CdnConfig;
use crate::error::SiteResult;
use crate::http::response::Reply;
use crate::observability::metrics;
use crate::security::constant_time_eq;
use crate::upstream::CdnPurger;

/// Query parameter carrying the credential.
pub const KEY_PARAM: &str = "fastly_api_key";
/// Reply body on success. The misspelling is what clients have always received.
pub const PURGE_OK: &str = "sucess";
/// Reply body on a credential mismatch.
pub const BAD_API_KEY: &str = "bad api key";

fn submitted_key(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == KEY_PARAM)
        .map(|(_, v)| v.into_owned())
}

/// Whether the submitted key unlocks the purge. An unset server key never does.
pub fn key_matches(config: &CdnConfig, submitted: Option<&str>) -> bool {
    match submitted {
        Some(key) if !config.api_key.is_empty() => {
            constant_time_eq(key.as_bytes(), config.api_key.as_bytes())
        }
        _ => false,
    }
}

/// Purge the whole service if the query carries the right key.
pub async fn purge(cdn: &dyn CdnPurger, config: &CdnConfig, query: Option<&str>) -> SiteResult<Reply> {
    let submitted = submitted_key(query);
    if !key_matches(config, submitted.as_deref()) {
        tracing::warn!(key_present = submitted.is_some(), "Purge rejected");
        metrics::record_purge("rejected");
        return Ok(Reply::Text(StatusCode::OK, BAD_API_KEY.to_string()));
    }

    match cdn.purge_all(&config.service_id).await {
        Ok(()) => {
            tracing::info!(service_id = %config.service_id, "Purged CDN cache");
            metrics::record_purge("purged");
            Ok(Reply::Text(StatusCode::OK, PURGE_OK.to_string()))
        }
        Err(e) => {
            tracing::error!(service_id = %config.service_id, error = %e, "CDN purge failed");
            metrics::record_purge("failed");
            Err(e.into())
        }
    }
}
