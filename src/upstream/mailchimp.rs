//! Mailchimp API client (list signup).

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{MailingList, UpstreamReply};
use crate::config::MailingListConfig;

/// Errors raised before or while talking to Mailchimp.
#[derive(Debug, Error)]
pub enum MailingListError {
    #[error("Missing email address")]
    MissingEmail,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Mailing list is not configured")]
    NotConfigured,

    #[error("Mailchimp request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl MailingListError {
    pub fn status(&self) -> StatusCode {
        match self {
            MailingListError::MissingEmail | MailingListError::InvalidEmail(_) => {
                StatusCode::BAD_REQUEST
            }
            MailingListError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            MailingListError::Http(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Member record posted to `lists/{list_id}/members`.
#[derive(Debug, Serialize, PartialEq)]
pub struct NewMember {
    pub email_address: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_fields: Option<Map<String, Value>>,
}

impl NewMember {
    /// Build a member from a signup form payload.
    ///
    /// The address is read from `email` or `email_address`; an optional
    /// `merge_fields` object is passed through.
    pub fn from_payload(
        mut payload: Map<String, Value>,
        double_opt_in: bool,
    ) -> Result<Self, MailingListError> {
        let email = ["email", "email_address"]
            .iter()
            .find_map(|key| match payload.remove(*key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .ok_or(MailingListError::MissingEmail)?;

        if !looks_like_email(&email) {
            return Err(MailingListError::InvalidEmail(email));
        }

        let merge_fields = match payload.remove("merge_fields") {
            Some(Value::Object(fields)) if !fields.is_empty() => Some(fields),
            _ => None,
        };

        Ok(Self {
            email_address: email,
            status: if double_opt_in { "pending" } else { "subscribed" },
            merge_fields,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Subscribes members through the Mailchimp v3 API.
#[derive(Clone)]
pub struct MailchimpClient {
    client: reqwest::Client,
    api_base: Option<String>,
    api_key: String,
    list_id: String,
    double_opt_in: bool,
}

impl MailchimpClient {
    pub fn new(client: reqwest::Client, config: &MailingListConfig) -> Self {
        Self {
            client,
            api_base: config.resolved_api_base(),
            api_key: config.api_key.clone(),
            list_id: config.list_id.clone(),
            double_opt_in: config.double_opt_in,
        }
    }

    fn members_url(&self) -> Option<String> {
        if self.api_key.is_empty() || self.list_id.is_empty() {
            return None;
        }
        self.api_base
            .as_ref()
            .map(|base| format!("{}/lists/{}/members", base, self.list_id))
    }
}

#[async_trait]
impl MailingList for MailchimpClient {
    async fn subscribe(&self, payload: Map<String, Value>) -> Result<UpstreamReply, MailingListError> {
        let url = self.members_url().ok_or(MailingListError::NotConfigured)?;
        let member = NewMember::from_payload(payload, self.double_opt_in)?;

        let resp = self
            .client
            .post(url)
            .basic_auth("anystring", Some(&self.api_key))
            .json(&member)
            .send()
            .await?;

        let reply = UpstreamReply::from_response(resp).await?;
        tracing::info!(status = reply.status, list_id = %self.list_id, "Mailchimp subscribe answered");
        Ok(reply)
    }
}
