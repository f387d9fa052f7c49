/// Message envelopes exchanged with the realtime transport
use crate::models::{Alert, AlertId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MessageId = Uuid;

/// Message received from the transport, routed by `channel`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel: channel.into(),
            kind: kind.into(),
            payload,
            id: None,
            timestamp: now_millis(),
        }
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Message handed to the transport by the outbound sender
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    pub id: MessageId,
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
}

impl OutboundMessage {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Why an alert left the visible set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    Dismissed,
    Expired,
    Cleared,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Dismissed => "dismissed",
            RemovalReason::Expired => "expired",
            RemovalReason::Cleared => "cleared",
        }
    }
}

/// Lifecycle events published by the alert center
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertEvent {
    /// Alert entered the visible set
    Shown { alert: Alert },

    /// Alert is waiting for a toast slot
    Queued { alert: Alert },

    /// Alert left the visible set or the pending queue
    Removed { id: AlertId, reason: RemovalReason },

    /// One alert was marked as read
    Read { id: AlertId },

    /// Every held alert was marked as read
    AllRead { count: usize },

    /// Everything was cleared
    Cleared { count: usize },
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_message_from_json() {
        let json = r#"{"channel":"alerts","type":"new_alert","payload":{"title":"Malware blocked"}}"#;
        let message = InboundMessage::from_json(json).unwrap();

        assert_eq!(message.channel, "alerts");
        assert_eq!(message.kind, "new_alert");
        assert_eq!(message.payload["title"], "Malware blocked");
        assert!(message.id.is_none());
        assert!(message.timestamp > 0);
    }

    #[test]
    fn test_inbound_message_rejects_missing_channel() {
        assert!(InboundMessage::from_json(r#"{"type":"ping"}"#).is_err());
    }

    #[test]
    fn test_outbound_message_uses_type_key() {
        let message = OutboundMessage {
            id: Uuid::new_v4(),
            channel: "agents".to_string(),
            kind: "isolate".to_string(),
            payload: json!({"agent_id": "a-17"}),
            timestamp: 0,
        };
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "isolate");
        assert_eq!(value["channel"], "agents");
    }

    #[test]
    fn test_alert_event_tag() {
        let event = AlertEvent::Removed {
            id: Uuid::nil(),
            reason: RemovalReason::Expired,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "removed");
        assert_eq!(value["reason"], "expired");
    }
}
