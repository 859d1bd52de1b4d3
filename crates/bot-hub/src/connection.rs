//! Client connection handles

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{Error, Result};
use crate::message::{Frame, OutboundMessage};

/// Frames buffered per connection. Broadcasts skip a connection whose queue
/// is full; direct replies wait for room.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 100;

pub type ConnectionId = String;

/// Metadata about a connection
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    /// When the connection was established
    pub connected_at: chrono::DateTime<chrono::Utc>,
    /// Client IP address (if available)
    pub client_ip: Option<String>,
    /// User agent (if available)
    pub user_agent: Option<String>,
}

/// Handle to one client's outbound frame queue.
///
/// The transport owns the receiving half and drains it onto the socket. The
/// connection counts as open for exactly as long as that receiver is alive.
#[derive(Debug)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    sender: mpsc::Sender<Frame>,
    /// Connection metadata
    pub metadata: ConnectionMetadata,
}

impl Connection {
    /// Create a new connection and the receiver its writer should drain
    pub fn new(
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) -> (Self, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let connection = Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            metadata: ConnectionMetadata {
                connected_at: chrono::Utc::now(),
                client_ip,
                user_agent,
            },
        };
        (connection, receiver)
    }

    /// Check if the transport is still accepting frames
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue an already-serialized frame
    pub async fn send_frame(&self, frame: Frame) -> Result<()> {
        self.sender
            .send(frame)
            .await
            .map_err(|_| Error::ConnectionClosed(self.id.clone()))
    }

    /// Queue a frame without waiting. A full queue fails this send only.
    pub fn try_send_frame(&self, frame: Frame) -> Result<()> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull(self.id.clone()),
            TrySendError::Closed(_) => Error::ConnectionClosed(self.id.clone()),
        })
    }

    /// Serialize and queue a message for this connection only
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.send_frame(message.to_frame()?).await
    }
}
