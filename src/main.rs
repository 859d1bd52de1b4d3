mod config;

use bot_hub::{Hub, SimulatedSource, TelegramProbe};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;

    tracing::info!(
        port = config.server.port,
        token_configured = config.telegram.token.is_some(),
        "Dashboard starting"
    );

    if config.telegram.token.is_none() {
        tracing::warn!("TELEGRAM_TOKEN not set - bot status will always report error");
    }

    Hub::builder()
        .port(config.server.port)
        .source(SimulatedSource::default())
        .probe(TelegramProbe::new(config.telegram.token))
        .build()?
        .run()
        .await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bot_dashboard=info,bot_hub=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
