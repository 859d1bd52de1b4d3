use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token. Without one the dashboard always reports status `error`.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

fn default_port() -> u16 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: default_port(),
            },
            telegram: TelegramConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an environment-like lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got {port:?}"))?;
        }

        config.telegram.token = lookup("TELEGRAM_TOKEN")
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.telegram.token.is_none());
    }

    #[test]
    fn reads_port_and_token() {
        let config =
            AppConfig::from_lookup(lookup(&[("PORT", "8081"), ("TELEGRAM_TOKEN", "123:abc")]))
                .unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.telegram.token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn falls_back_to_bot_token_variable() {
        let config = AppConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "456:def")])).unwrap();
        assert_eq!(config.telegram.token.as_deref(), Some("456:def"));

        let config = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_BOT_TOKEN", "456:def"),
        ]))
        .unwrap();
        assert_eq!(config.telegram.token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[("TELEGRAM_TOKEN", "  ")])).unwrap();
        assert!(config.telegram.token.is_none());
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "70000")])).is_err());
    }
}
