//! Event Source trait and implementations
//!
//! Implement `EventSource` to feed the hub from any backend. The simulated
//! source shipped here stands in for the bot's real activity feed.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::catalog;
use crate::message::OutboundMessage;

/// Callback the hub hands to a source; every message pushed is broadcast to
/// all open connections.
pub type EventSink = Arc<dyn Fn(OutboundMessage) + Send + Sync>;

/// Trait for event sources
///
/// # Example
///
/// ```rust,ignore
/// use bot_hub::{EventSource, EventSink, OutboundMessage};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// struct BotFeed {
///     url: String,
/// }
///
/// #[async_trait]
/// impl EventSource for BotFeed {
///     async fn start(&self, sink: EventSink, cancel: CancellationToken) -> anyhow::Result<()> {
///         loop {
///             tokio::select! {
///                 _ = cancel.cancelled() => break,
///                 event = next_activity(&self.url) => sink(OutboundMessage::Activity(event)),
///             }
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str { "BotFeed" }
/// }
/// ```
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Start producing events
    ///
    /// This method should run until the cancellation token is triggered.
    async fn start(&self, sink: EventSink, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Return the source name (for logging)
    fn name(&self) -> &'static str;
}

/// Random activity and price-alert events on two independent timers
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    activity_interval: Duration,
    price_alert_interval: Duration,
    seed: Option<u64>,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self {
            activity_interval: Duration::from_secs(5),
            price_alert_interval: Duration::from_secs(10),
            seed: None,
        }
    }
}

impl SimulatedSource {
    pub fn new(activity_interval: Duration, price_alert_interval: Duration) -> Self {
        Self {
            activity_interval,
            price_alert_interval,
            seed: None,
        }
    }

    /// Make the sampled sequence reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Fire `emit` every `period` until cancelled. The first tick is one full
/// period after start; ticks missed while stalled are dropped.
async fn run_timer<F>(period: Duration, cancel: CancellationToken, mut emit: F)
where
    F: FnMut() + Send,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => emit(),
        }
    }
}

#[async_trait]
impl EventSource for SimulatedSource {
    async fn start(&self, sink: EventSink, cancel: CancellationToken) -> anyhow::Result<()> {
        tracing::info!(
            activity_interval_ms = self.activity_interval.as_millis() as u64,
            price_alert_interval_ms = self.price_alert_interval.as_millis() as u64,
            "SimulatedSource started"
        );

        let mut activity_rng = self.rng(0);
        let activity_sink = sink.clone();
        let activities = run_timer(self.activity_interval, cancel.clone(), move || {
            activity_sink(catalog::random_activity(&mut activity_rng).into());
        });

        let mut price_rng = self.rng(1);
        let price_sink = sink;
        let price_alerts = run_timer(self.price_alert_interval, cancel, move || {
            price_sink(catalog::random_price_alert(&mut price_rng).into());
        });

        tokio::join!(activities, price_alerts);

        tracing::info!("SimulatedSource stopped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Simulated"
    }
}

/// Source with no events. A hub built on it only greets clients and answers
/// their status requests. This is the builder's source until one is set.
pub struct NoopSource;

#[async_trait]
impl EventSource for NoopSource {
    async fn start(&self, _sink: EventSink, cancel: CancellationToken) -> anyhow::Result<()> {
        tracing::info!("Event feed disabled, serving status only");
        cancel.cancelled().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "StatusOnly"
    }
}

/// A channel-based source for programmatic event pushing
///
/// Useful for testing or when events come from your own code.
pub struct ChannelSource {
    receiver: tokio::sync::Mutex<Option<tokio::sync::mpsc::Receiver<OutboundMessage>>>,
}

impl ChannelSource {
    /// Create a new channel source
    pub fn new() -> (Self, tokio::sync::mpsc::Sender<OutboundMessage>) {
        let (tx, rx) = tokio::sync::mpsc::channel(1000);
        (
            Self {
                receiver: tokio::sync::Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn start(&self, sink: EventSink, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow::anyhow!("ChannelSource can only be started once"))?;

        tracing::info!("ChannelSource started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = receiver.recv() => {
                    match msg {
                        Some(msg) => sink(msg),
                        None => break,
                    }
                }
            }
        }

        tracing::info!("ChannelSource stopped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Channel"
    }
}
