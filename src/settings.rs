use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::Token;
use crate::error::Result;

pub const API_URL: &str = "api_url";
pub const API_USER: &str = "api_user";
pub const API_KEY: &str = "api_key";
pub const GO_SERVER_URL: &str = "go_server_url";

/// Plugin settings as stored by the GoCD server.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSettings {
    api_url: String,
    api_user: String,
    api_key: Token,
    go_server_url: String,
}

impl PluginSettings {
    pub fn new(api_url: &str, api_user: &str, api_key: Token, go_server_url: &str) -> Self {
        Self {
            api_url: api_url.to_owned(),
            api_user: api_user.to_owned(),
            api_key,
            go_server_url: go_server_url.to_owned(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_user(&self) -> &str {
        &self.api_user
    }

    pub fn api_key(&self) -> &Token {
        &self.api_key
    }

    pub fn go_server_url(&self) -> &str {
        &self.go_server_url
    }
}

/// Source of plugin settings, asked once per request.
pub trait SettingsProvider {
    fn plugin_settings(&self) -> Result<PluginSettings>;
}

impl SettingsProvider for PluginSettings {
    fn plugin_settings(&self) -> Result<PluginSettings> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl ValidationError {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Raw setting values as submitted from the settings form, any of which may be missing.
#[derive(Debug, Default, Clone)]
pub struct SettingsForm {
    pub api_url: Option<String>,
    pub api_user: Option<String>,
    pub api_key: Option<String>,
    pub go_server_url: Option<String>,
}

impl SettingsForm {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        validate_url(API_URL, "Bitbucket API URL", self.api_url.as_deref(), &mut errors);
        validate_present(API_USER, "Bitbucket user", self.api_user.as_deref(), &mut errors);
        validate_present(API_KEY, "Bitbucket API key", self.api_key.as_deref(), &mut errors);
        validate_url(
            GO_SERVER_URL,
            "GoCD server URL",
            self.go_server_url.as_deref(),
            &mut errors,
        );

        errors
    }
}

fn validate_present(
    key: &str,
    label: &str,
    value: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> bool {
    match value {
        Some(v) if !v.trim().is_empty() => true,
        _ => {
            errors.push(ValidationError::new(key, format!("{label} must not be blank.")));
            false
        }
    }
}

fn validate_url(key: &str, label: &str, value: Option<&str>, errors: &mut Vec<ValidationError>) {
    if !validate_present(key, label, value, errors) {
        return;
    }

    let value = value.unwrap_or_default().trim();
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            key,
            format!("{label} must use http or https, got '{}'.", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            key,
            format!("{label} is not a valid URL: {e}."),
        )),
    }
}
