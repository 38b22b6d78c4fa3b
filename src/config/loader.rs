//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SiteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file into a config, without env overrides or validation.
pub fn read_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply the environment variables the site has always been deployed with.
///
/// `lookup` abstracts `std::env::var` so tests can inject values.
pub fn apply_env_overrides<F>(config: &mut SiteConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            key: "PORT",
            value: port.clone(),
        })?;
    }
    if let Some(key) = lookup("FASTLY_API_KEY") {
        config.cdn.api_key = key;
    }
    if let Some(service) = lookup("FASTLY_SERVICE_ID") {
        config.cdn.service_id = service;
    }
    if let Some(key) = lookup("MAILCHIMP_API_KEY") {
        config.mailing_list.api_key = key;
    }
    if let Some(list) = lookup("MAILCHIMP_LIST_ID") {
        config.mailing_list.list_id = list;
    }
    Ok(())
}

/// Load configuration: defaults, then the optional file, then the environment.
/// The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    load_config_with(path, |_| {})
}

/// Like [`load_config`], with a last round of overrides (command-line flags)
/// applied before validation.
pub fn load_config_with<F>(path: Option<&Path>, overrides: F) -> Result<SiteConfig, ConfigError>
where
    F: FnOnce(&mut SiteConfig),
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => SiteConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("PORT", "8443"),
                ("FASTLY_API_KEY", "fastly-secret"),
                ("FASTLY_SERVICE_ID", "svc123"),
                ("MAILCHIMP_API_KEY", "abc-us6"),
                ("MAILCHIMP_LIST_ID", "list1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 8443);
        assert_eq!(config.cdn.api_key, "fastly-secret");
        assert_eq!(config.cdn.service_id, "svc123");
        assert_eq!(config.mailing_list.api_key, "abc-us6");
        assert_eq!(config.mailing_list.list_id, "list1");
    }

    #[test]
    fn test_bad_port_env() {
        let mut config = SiteConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "PORT", .. }));
    }

    #[test]
    fn test_read_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nport = 4000\n\n[static_files]\nroot = \"/srv/www\"").unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.static_files.root, std::path::PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_config_file(Path::new("/nonexistent/site.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_overrides_apply_before_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let config = load_config_with(None, |c| {
            c.static_files.root = root.clone();
            c.listener.port = 4100;
        })
        .unwrap();
        assert_eq!(config.static_files.root, root);
        assert_eq!(config.listener.port, 4100);

        let err = load_config_with(None, |c| c.static_files.root = "/nonexistent/www".into())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
