//! Hub builder and runner

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handler::{self, HubState};
use crate::message::{OutboundMessage, StatsSnapshot};
use crate::probe::StatusProbe;
use crate::registry::ConnectionRegistry;
use crate::source::{EventSink, EventSource, NoopSource};

/// Hub configuration and runner
pub struct Hub<Source: EventSource> {
    port: u16,
    source: Source,
    probe: Arc<dyn StatusProbe>,
    registry: ConnectionRegistry,
    stats: StatsSnapshot,
}

impl<Source: EventSource> Hub<Source> {
    /// The registry this hub fans events out through
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Build the HTTP router: WebSocket endpoint plus health and API routes
    pub fn router(&self) -> Router {
        let state = HubState {
            registry: self.registry.clone(),
            probe: self.probe.clone(),
            stats: self.stats,
        };

        Router::new()
            .route("/", get(handler::ws_connect))
            .route("/ws", get(handler::ws_connect))
            .route("/health", get(handler::health))
            .route("/ready", get(|| async { "READY" }))
            .route("/api/status", get(handler::get_status))
            .route("/api/stats", get(handler::get_stats))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured port and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();

        tracing::info!(
            source = self.source.name(),
            probe = self.probe.name(),
            "Starting bot hub"
        );

        let app = self.router();

        // Start event source
        let sink = Dispatcher::new(self.registry.clone()).into_sink();
        let source = self.source;
        let source_cancel = cancel.clone();
        let source_name = source.name();
        tokio::spawn(async move {
            if let Err(e) = source.start(sink, source_cancel).await {
                tracing::error!(error = %e, source = source_name, "Event source error");
            }
        });

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        cancel.cancel();
        result?;

        tracing::info!("Hub shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Builder for Hub
pub struct HubBuilder<Source = NoopSource> {
    port: u16,
    source: Option<Source>,
    probe: Option<Arc<dyn StatusProbe>>,
    stats: StatsSnapshot,
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self {
            port: 3000,
            source: Some(NoopSource),
            probe: None,
            stats: StatsSnapshot::default(),
        }
    }
}

impl Hub<NoopSource> {
    /// Create a new hub builder
    pub fn builder() -> HubBuilder {
        HubBuilder::default()
    }
}

impl<Source> HubBuilder<Source> {
    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the event source
    pub fn source<S: EventSource>(self, source: S) -> HubBuilder<S> {
        HubBuilder {
            port: self.port,
            source: Some(source),
            probe: self.probe,
            stats: self.stats,
        }
    }

    /// Set the status probe
    pub fn probe<P: StatusProbe>(mut self, probe: P) -> Self {
        let probe: Arc<dyn StatusProbe> = Arc::new(probe);
        self.probe = Some(probe);
        self
    }

    /// Override the stats snapshot sent to new connections
    pub fn stats(mut self, stats: StatsSnapshot) -> Self {
        self.stats = stats;
        self
    }
}

impl<Source: EventSource> HubBuilder<Source> {
    /// Build the hub
    pub fn build(self) -> anyhow::Result<Hub<Source>> {
        let source = self.source.ok_or_else(|| anyhow::anyhow!("Source is required"))?;
        let probe = self.probe.ok_or_else(|| anyhow::anyhow!("Probe is required"))?;

        Ok(Hub {
            port: self.port,
            source,
            probe,
            registry: ConnectionRegistry::new(),
            stats: self.stats,
        })
    }
}

/// Routes messages from the event source into the registry
struct Dispatcher {
    registry: ConnectionRegistry,
}

impl Dispatcher {
    fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    fn handle(&self, message: OutboundMessage) {
        let sent = self.registry.broadcast(&message);
        tracing::debug!(kind = message.kind(), sent_count = sent, "Event dispatched");
    }

    /// Broadcasts inline on the source's task. `broadcast` never waits, and
    /// each connection sees events in the order the source pushed them.
    fn into_sink(self) -> EventSink {
        Arc::new(move |message| self.handle(message))
    }
}
