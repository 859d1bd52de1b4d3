//! Registry of open client connections

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::connection::{Connection, ConnectionId};
use crate::error::Error;
use crate::message::OutboundMessage;

/// Set of currently open connections, shared between the socket handlers and
/// the event sink.
///
/// Removal is the socket handler's job: `broadcast` skips closed members but
/// never evicts them.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns `false` if it was already present.
    pub fn add(&self, connection: Arc<Connection>) -> bool {
        let connection_id = connection.id.clone();
        let inserted = match self.connections.entry(connection_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(connection);
                true
            }
        };

        // Shard lock is released by now; len() would deadlock inside the match
        if inserted {
            info!(
                connection_id = %connection_id,
                total_connections = self.connections.len(),
                "Connection registered"
            );
        }
        inserted
    }

    /// Unregister a connection. Returns `false` if it was not present.
    pub fn remove(&self, connection_id: &str) -> bool {
        if self.connections.remove(connection_id).is_some() {
            info!(
                connection_id = %connection_id,
                remaining_connections = self.connections.len(),
                "Connection unregistered"
            );
            true
        } else {
            false
        }
    }

    /// Send one message to every open connection.
    ///
    /// The message is serialized once and queued without waiting, so a
    /// client that stops reading never holds up the others or the caller.
    /// Members that are closed or whose queue is full are skipped for this
    /// message only. Returns the number of connections the frame was queued on.
    pub fn broadcast(&self, message: &OutboundMessage) -> usize {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, kind = message.kind(), "Failed to encode broadcast");
                return 0;
            }
        };

        // Snapshot members so sends happen outside the shard locks
        let recipients: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .filter(|entry| entry.value().is_open())
            .map(|entry| entry.value().clone())
            .collect();

        let mut sent_count = 0;
        for connection in &recipients {
            match connection.try_send_frame(frame.clone()) {
                Ok(()) => sent_count += 1,
                Err(Error::QueueFull(_)) => {
                    warn!(connection_id = %connection.id, "Client lagging, dropping broadcast");
                }
                Err(e) => {
                    debug!(error = %e, "Skipping connection during broadcast");
                }
            }
        }

        debug!(kind = message.kind(), sent_count, "Broadcast event to all connections");
        sent_count
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Get total connection count
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// List all connections
    pub fn list_connections(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
