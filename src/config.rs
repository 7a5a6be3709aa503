//! Application configuration management with security considerations.
//!
//! Every value is read from the environment once at startup through
//! [`init_config`]. Sensitive fields are marked and must never be logged.

use crate::{connection::RetryPolicy, consts, whatsapp};
use anyhow::Context;
use envconfig::Envconfig;
use std::{sync::OnceLock, time::Duration};

/// Bridge configuration loaded from environment variables.
///
/// # Security Requirements
/// - All `SENSITIVE` fields must be stored securely (encrypted at rest)
/// - Never log or expose sensitive values
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(from = "PORT", default = "3000")]
    pub web_server_port: u16,

    /// Path to SSL private key file (SENSITIVE PATH), used only in prod
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE), used only in prod
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// Directory holding the persisted session credentials (SENSITIVE CONTENT)
    /// Security: directory should only be readable by the service user
    #[envconfig(default = "auth_info")]
    pub session_dir: String,

    /// WhatsApp Business phone number ID used when no session file exists yet
    /// (SEMI-SENSITIVE)
    pub whatsapp_phone_number_id: Option<String>,

    /// 🔒 SENSITIVE: access token used when no session file exists yet
    pub whatsapp_access_token: Option<String>,

    /// Meta app id, enables periodic token refresh together with the secret
    /// (NON-SENSITIVE)
    pub whatsapp_app_id: Option<String>,

    /// 🔒 SENSITIVE: Meta app secret
    pub whatsapp_app_secret: Option<String>,

    /// Graph API base url including the version (NON-SENSITIVE)
    #[envconfig(default = "https://graph.facebook.com/v22.0")]
    pub whatsapp_graph_api_url: String,

    /// Seconds to wait before reconnecting after a connection closed
    #[envconfig(default = "5")]
    pub reconnect_delay_secs: u64,

    /// Seconds to wait before retrying after a connect attempt failed
    #[envconfig(default = "10")]
    pub connect_retry_delay_secs: u64,

    /// Seconds between liveness probes of an open connection
    #[envconfig(default = "30")]
    pub keepalive_interval_secs: u64,

    /// Seconds a single Graph API request may take before it is abandoned
    #[envconfig(default = "20")]
    pub request_timeout_secs: u64,

    /// Hours between access token refreshes
    #[envconfig(default = "24")]
    pub token_refresh_hours: u64,

    /// Send a message to the account's own number after the first successful
    /// connection of the process; reconnects stay silent
    #[envconfig(default = "true")]
    pub notify_on_connect: bool,

    /// 🔒 SENSITIVE: Logfire write token, logs stay local when unset
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            connect_retry_delay: Duration::from_secs(self.connect_retry_delay_secs),
        }
    }

    /// Credentials to start from when the session directory is still empty
    pub fn bootstrap_credentials(&self) -> Option<whatsapp::Credentials> {
        match (&self.whatsapp_phone_number_id, &self.whatsapp_access_token) {
            (Some(phone_number_id), Some(access_token)) => Some(whatsapp::Credentials::new(
                phone_number_id.to_string(),
                access_token.to_string(),
            )),
            _ => None,
        }
    }

    pub fn app_credentials(&self) -> Option<whatsapp::client::AppCredentials> {
        match (&self.whatsapp_app_id, &self.whatsapp_app_secret) {
            (Some(app_id), Some(app_secret)) => Some(whatsapp::client::AppCredentials {
                app_id: app_id.to_string(),
                app_secret: app_secret.to_string(),
            }),
            _ => None,
        }
    }

    pub fn client_options(&self) -> whatsapp::client::ClientOptions {
        let graph_api_url = match self.whatsapp_graph_api_url.trim_end_matches('/') {
            "" => consts::DEFAULT_GRAPH_API_URL.to_string(),
            url => url.to_string(),
        };

        whatsapp::client::ClientOptions {
            graph_api_url,
            app: self.app_credentials(),
            keepalive_interval: Duration::from_secs(self.keepalive_interval_secs.max(1)),
            token_refresh_interval: Duration::from_secs(
                self.token_refresh_hours.max(1).saturating_mul(3600),
            ),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

/// Global application configuration, set once by [`init_config`]
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads the configuration from the environment into [`APP_CONFIG`]
pub fn init_config() -> anyhow::Result<()> {
    let app_config = AppConfig::init_from_env()
        .context("failed to load configuration from environment variables")?;

    APP_CONFIG
        .set(app_config)
        .map_err(|_| anyhow::anyhow!("app config was already initialized"))
}
