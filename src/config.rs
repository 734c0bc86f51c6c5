//! Environment-sourced settings
//!
//! All configuration comes from process environment variables, read once at
//! startup. Variable names map to fields by lowercasing (`OPENAI_API_KEY` ->
//! `openai_api_key`). Empty values are treated as absent.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_timeout_seconds")]
    pub openai_timeout_seconds: u64,
    #[serde(default)]
    pub langfuse_public_key: Option<String>,
    #[serde(default)]
    pub langfuse_secret_key: Option<String>,
    #[serde(default)]
    pub langfuse_host: Option<String>,
}

/// Langfuse credentials, present only when all three values are configured
#[derive(Debug, Clone)]
pub struct LangfuseCredentials {
    pub public_key: String,
    pub secret_key: String,
    pub host: String,
}

impl Settings {
    /// Whether an LLM provider credential is configured
    pub fn openai_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn openai_timeout(&self) -> Duration {
        Duration::from_secs(self.openai_timeout_seconds)
    }

    /// Langfuse credentials if public key, secret key and host are all set
    pub fn langfuse_credentials(&self) -> Option<LangfuseCredentials> {
        match (
            &self.langfuse_public_key,
            &self.langfuse_secret_key,
            &self.langfuse_host,
        ) {
            (Some(public_key), Some(secret_key), Some(host)) => Some(LangfuseCredentials {
                public_key: public_key.clone(),
                secret_key: secret_key.clone(),
                host: host.clone(),
            }),
            _ => None,
        }
    }

    fn normalized(mut self) -> Self {
        for value in [
            &mut self.openai_api_key,
            &mut self.langfuse_public_key,
            &mut self.langfuse_secret_key,
            &mut self.langfuse_host,
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_env: default_app_env(),
            log_level: default_log_level(),
            host: default_host(),
            port: default_port(),
            openai_api_key: None,
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            openai_timeout_seconds: default_openai_timeout_seconds(),
            langfuse_public_key: None,
            langfuse_secret_key: None,
            langfuse_host: None,
        }
    }
}

fn default_app_env() -> String {
    "dev".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_timeout_seconds() -> u64 {
    60
}

/// Load settings from the process environment
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(None)
}

/// Load settings from an explicit variable map instead of the process
/// environment when `source` is `Some`
pub fn load_settings_from(
    source: Option<config::Map<String, String>>,
) -> anyhow::Result<Settings> {
    let config = config::Config::builder()
        .add_source(config::Environment::default().source(source))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    Ok(settings.normalized())
}
