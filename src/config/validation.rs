//! Configuration validation.
//!
//! Serde handles syntax; this module checks that the values make sense
//! together. All problems are collected, not just the first.

use thiserror::Error;

use crate::config::schema::SiteConfig;
use crate::http::cookies::is_cookie_token;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("{field} is required when {required_by} is set")]
    MissingField {
        field: &'static str,
        required_by: &'static str,
    },

    #[error("{field} is not an absolute http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("mailing_list.api_key has no datacenter suffix and mailing_list.api_base is unset")]
    NoDatacenter,

    #[error("static_files.root is not a directory: {0}")]
    StaticRoot(String),

    #[error("csrf.cookie_name is not a valid cookie name: {0}")]
    CookieName(String),

    #[error("csrf.token_length must be between 16 and 256")]
    TokenLength,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if !config.cdn.api_key.is_empty() && config.cdn.service_id.is_empty() {
        errors.push(ValidationError::MissingField {
            field: "cdn.service_id",
            required_by: "cdn.api_key",
        });
    }
    check_url(&mut errors, "cdn.api_base", &config.cdn.api_base);

    let mailing = &config.mailing_list;
    if !mailing.api_key.is_empty() {
        if mailing.list_id.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "mailing_list.list_id",
                required_by: "mailing_list.api_key",
            });
        }
        if mailing.api_base.is_none() && mailing.datacenter().is_none() {
            errors.push(ValidationError::NoDatacenter);
        }
    }
    if let Some(base) = &mailing.api_base {
        check_url(&mut errors, "mailing_list.api_base", base);
    }

    if !config.static_files.root.is_dir() {
        errors.push(ValidationError::StaticRoot(
            config.static_files.root.display().to_string(),
        ));
    }

    if !is_cookie_token(&config.csrf.cookie_name) {
        errors.push(ValidationError::CookieName(config.csrf.cookie_name.clone()));
    }
    if !(16..=256).contains(&config.csrf.token_length) {
        errors.push(ValidationError::TokenLength);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
