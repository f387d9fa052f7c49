use super::OutboundMessage;
use thiserror::Error;
use tokio::sync::mpsc;

/// Type alias for the outbound frame sender
pub type OutboundSenderTx = mpsc::UnboundedSender<OutboundMessage>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
}

/// Delivery side of the realtime connection
///
/// Implementations must not block; retries and backoff are theirs to own.
pub trait Transport: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;
}

/// Transport that hands messages to an mpsc channel
///
/// The websocket client drains the receiving end; tests read it directly.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: OutboundSenderTx,
}

impl ChannelTransport {
    pub fn new(tx: OutboundSenderTx) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.tx.send(message).map_err(|_| TransportError::Closed)
    }
}
