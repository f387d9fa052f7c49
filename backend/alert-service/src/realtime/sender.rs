/// Outbound Message Sender
///
/// Assigns message ids and forwards to the transport. Failures are
/// signalled with `None`; the caller decides whether to surface them.
use super::{ConnectionTracker, MessageId, OutboundMessage, Transport};
use crate::metrics;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct OutboundSender {
    tracker: ConnectionTracker,
    transport: Arc<dyn Transport>,
}

impl OutboundSender {
    pub fn new(tracker: ConnectionTracker, transport: Arc<dyn Transport>) -> Self {
        Self { tracker, transport }
    }

    /// Send a message; returns its id, or `None` when it could not be handed off
    pub fn send(
        &self,
        channel: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Option<MessageId> {
        let channel = channel.into();
        if !self.tracker.is_connected() {
            tracing::debug!(
                channel = %channel,
                state = %self.tracker.state(),
                "Dropping outbound message, transport not connected"
            );
            metrics::record_send("not_connected");
            return None;
        }

        let message = OutboundMessage {
            id: Uuid::new_v4(),
            channel,
            kind: kind.into(),
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let id = message.id;

        match self.transport.send(message) {
            Ok(()) => {
                metrics::record_send("sent");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(message_id = %id, error = %e, "Transport rejected outbound message");
                metrics::record_send("rejected");
                None
            }
        }
    }
}
