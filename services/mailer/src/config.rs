use std::str::FromStr;
use std::time::Duration;

use cron::Schedule;
use serde::Deserialize;

use mailcraft_core::config::Config;
use mailcraft_core::retry::RetryPolicy;

/// Mailer service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    /// Nylas API key, sent as a bearer token on every provider call.
    pub nylas_api_key: String,
    /// Nylas API base URI. Env var: `NYLAS_API_URI`.
    #[serde(default = "default_nylas_api_uri")]
    pub nylas_api_uri: String,
    /// OAuth client id of the Nylas application.
    pub nylas_client_id: String,
    /// OAuth client secret. Falls back to the API key when unset.
    pub nylas_client_secret: Option<String>,
    /// Callback registered with the provider; must route to `/oauth/exchange`.
    #[serde(default = "default_nylas_redirect_uri")]
    pub nylas_redirect_uri: String,
    #[serde(default = "default_nylas_provider")]
    pub nylas_provider: String,

    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// SQLite connection URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Redis URL for session grants. In-memory storage is used when unset.
    pub redis_url: Option<String>,
    /// TCP port to listen on (default 5000). Env var: `MAILER_PORT`.
    #[serde(default = "default_mailer_port")]
    pub mailer_port: u16,
    /// Lifetime of a session grant and its cookie.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub cookie_secure: bool,

    /// Reply-to address on bulk and campaign sends.
    pub sender_email: Option<String>,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Cron expression (7-field, UTC) driving recurring campaigns.
    #[serde(default = "default_campaign_recurrence")]
    pub campaign_recurrence: String,
    #[serde(default = "default_scheduler_tick_secs")]
    pub scheduler_tick_secs: u64,

    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_backoff_factor")]
    pub retry_backoff_factor: u32,
}

impl Config for MailerConfig {}

impl MailerConfig {
    pub fn client_secret(&self) -> &str {
        self.nylas_client_secret
            .as_deref()
            .unwrap_or(&self.nylas_api_key)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_backoff_factor)
    }

    pub fn recurrence(&self) -> Result<Schedule, cron::error::Error> {
        Schedule::from_str(&self.campaign_recurrence)
    }

    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_secs.max(1))
    }
}

fn default_nylas_api_uri() -> String {
    "https://api.us.nylas.com".to_owned()
}

fn default_nylas_redirect_uri() -> String {
    "http://127.0.0.1:5000/oauth/exchange".to_owned()
}

fn default_nylas_provider() -> String {
    "google".to_owned()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_database_url() -> String {
    "sqlite://mailcraft.db?mode=rwc".to_owned()
}

fn default_mailer_port() -> u16 {
    5000
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_sender_name() -> String {
    "Mailcraft".to_owned()
}

fn default_campaign_recurrence() -> String {
    "0 0 9 * * Mon *".to_owned()
}

fn default_scheduler_tick_secs() -> u64 {
    30
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_factor() -> u32 {
    2
}
