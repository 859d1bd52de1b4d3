//! Bot liveness probe
//!
//! Implement `StatusProbe` to report bot health from any backend. The hub
//! calls `check` once per connecting client and once per status request; the
//! result is never cached.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::{BotStatus, StatusRecord};

/// Public Telegram Bot API endpoint
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Trait for status probes
///
/// `check` must not fail: implementations fold every error into the returned
/// record.
#[async_trait]
pub trait StatusProbe: Send + Sync + 'static {
    /// Query the upstream service and reduce the answer to a status record
    async fn check(&self) -> StatusRecord;

    /// Return the probe name (for logging)
    fn name(&self) -> &'static str;
}

/// Envelope every Bot API method answers with
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookInfo {
    #[serde(default)]
    url: String,
}

/// Probe backed by the Telegram Bot API (`getMe` + `getWebhookInfo`)
#[derive(Clone)]
pub struct TelegramProbe {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TelegramProbe {
    /// Probe the public Bot API. Without a token every check reports `error`.
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(TELEGRAM_API_URL, token)
    }

    /// Probe a Bot API server at a custom address (self-hosted Bot API, tests)
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        method: &str,
    ) -> Result<ApiResponse<T>> {
        let response = self
            .client
            .get(self.method_url(token, method))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ApiResponse<T>>().await?)
    }

    /// `true` if the bot answered `getMe` with `ok: true`
    async fn bot_reachable(&self, token: &str) -> Result<bool> {
        let response: ApiResponse<BotUser> = self.call(token, "getMe").await?;
        if let Some(user) = &response.result {
            debug!(bot_id = user.id, username = ?user.username, "getMe answered");
        }
        Ok(response.ok)
    }

    /// `true` if a webhook URL is configured for the bot
    async fn webhook_configured(&self, token: &str) -> Result<bool> {
        let response: ApiResponse<WebhookInfo> = self.call(token, "getWebhookInfo").await?;
        if !response.ok {
            debug!(description = ?response.description, "getWebhookInfo not ok");
            return Ok(false);
        }
        let info = response
            .result
            .ok_or_else(|| Error::Upstream("getWebhookInfo returned no result".to_string()))?;
        Ok(!info.url.is_empty())
    }
}

#[async_trait]
impl StatusProbe for TelegramProbe {
    async fn check(&self) -> StatusRecord {
        let Some(token) = self.token.as_deref() else {
            debug!("No bot token configured, reporting error status");
            return StatusRecord::error();
        };

        let (bot, webhook) = tokio::join!(
            self.bot_reachable(token),
            self.webhook_configured(token),
        );

        match (bot, webhook) {
            (Ok(reachable), Ok(webhook_configured)) => StatusRecord {
                bot: if reachable {
                    BotStatus::Online
                } else {
                    BotStatus::Offline
                },
                webhook_configured,
            },
            (Err(e), _) | (_, Err(e)) => {
                // reqwest errors carry the URL, which embeds the token
                warn!(error = %redact(&e, token), "Bot status check failed");
                StatusRecord::error()
            }
        }
    }

    fn name(&self) -> &'static str {
        "Telegram"
    }
}

fn redact(error: &Error, token: &str) -> String {
    error.to_string().replace(token, "<redacted>")
}

/// A probe that always reports the same record (for testing)
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub StatusRecord);

#[async_trait]
impl StatusProbe for FixedProbe {
    async fn check(&self) -> StatusRecord {
        self.0
    }

    fn name(&self) -> &'static str {
        "Fixed"
    }
}
