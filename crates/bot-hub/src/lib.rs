//! # Bot Hub
//!
//! A WebSocket broadcast hub for bot dashboards. Connected browsers receive a
//! stats snapshot and the bot's current status on connect, every event pushed
//! by the configured source, and a fresh status whenever they ask for one.
//!
//! ## Features
//!
//! - **Fan-out**: one serialization per event, delivered to every open connection
//! - **Status probe**: Telegram `getMe` + `getWebhookInfo`, reduced to online/offline/error
//! - **Pluggable sources**: implement `EventSource` to replace the simulated feed
//! - **Built-in Server**: Axum-based WebSocket and health endpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bot_hub::{Hub, SimulatedSource, TelegramProbe};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Hub::builder()
//!         .port(3000)
//!         .source(SimulatedSource::default())
//!         .probe(TelegramProbe::new(std::env::var("TELEGRAM_TOKEN").ok()))
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```
//!
//! ## Wire protocol
//!
//! Client to server: `{"type":"request","data":"status"}`.
//!
//! Server to client, discriminated by `type`: `stats`, `status`, `activity`,
//! `priceAlert`. See [`OutboundMessage`].

pub mod catalog;
mod connection;
mod error;
mod message;
pub mod probe;
mod registry;
pub mod source;

#[cfg(feature = "server")]
mod handler;
#[cfg(feature = "server")]
mod hub;

// Re-exports
pub use connection::{Connection, ConnectionId, ConnectionMetadata, OUTBOUND_QUEUE_CAPACITY};
pub use error::{Error, Result};
pub use message::{
    parse_client_message, ActivityEvent, BotStatus, ClientRequest, Frame, OutboundMessage,
    PriceAlertEvent, StatsSnapshot, StatusRecord,
};
pub use probe::{FixedProbe, StatusProbe, TelegramProbe};
pub use registry::ConnectionRegistry;
pub use source::{ChannelSource, EventSink, EventSource, NoopSource, SimulatedSource};

#[cfg(feature = "server")]
pub use hub::{Hub, HubBuilder};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
