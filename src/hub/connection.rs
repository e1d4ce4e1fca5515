//! Connection Handles
//!
//! Opaque handles to live duplex channels. The transport owns the socket;
//! the core only sees a bounded outbound queue plus a shared open flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Payload carried to each recipient. Shared so fan-out never copies the text.
pub type Payload = Arc<str>;

/// Unique token identifying one registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Observable state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Per-recipient delivery failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Connection closed")]
    Closed,

    #[error("Outbound queue full")]
    QueueFull,
}

/// Handle for sending messages to a specific connection
///
/// Cloning is cheap; every clone refers to the same connection and sees
/// the same state.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<Payload>,
    open: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue.
    ///
    /// The transport drains the receiver into the socket.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            sender,
            open: Arc::new(AtomicBool::new(true)),
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        if self.open.load(Ordering::Acquire) && !self.sender.is_closed() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Mark the connection closed. Later sends fail with [`DeliveryError::Closed`].
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Enqueue a payload without waiting for the transport.
    pub fn send(&self, payload: Payload) -> Result<(), DeliveryError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(DeliveryError::Closed);
        }

        self.sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
