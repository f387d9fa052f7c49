//! Feeds alerts arriving on a realtime channel into the alert center.
//!
//! Registry handlers run synchronously, so the handler only parses and
//! enqueues; a worker task drains the queue into the center.
use super::context::AppContext;
use crate::models::{AlertId, AlertPriority, NewAlert};
use crate::realtime::{InboundMessage, Subscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const NEW_ALERT: &str = "new_alert";
pub const DISMISS_ALERT: &str = "dismiss_alert";

#[derive(Debug, Clone, PartialEq)]
enum BridgeCommand {
    Show(NewAlert),
    Dismiss(AlertId),
}

/// Keeps the channel subscription alive; dropping it detaches the bridge
pub struct AlertBridge {
    subscription: Subscription,
    worker: JoinHandle<()>,
}

impl AlertBridge {
    pub fn attach(ctx: &AppContext, channel: &str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BridgeCommand>();

        let subscription = ctx.channels.subscribe(channel, move |message| {
            match parse_command(message) {
                Some(command) => {
                    // Worker gone means we are shutting down
                    let _ = tx.send(command);
                }
                None => tracing::debug!(
                    channel = %message.channel,
                    kind = %message.kind,
                    "Ignoring message on alerts channel"
                ),
            }
        });

        let center = ctx.alerts.clone();
        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    BridgeCommand::Show(new_alert) => {
                        center.show_alert(new_alert).await;
                    }
                    BridgeCommand::Dismiss(id) => {
                        center.dismiss(id).await;
                    }
                }
            }
            tracing::debug!("Alert bridge worker stopped");
        });

        tracing::info!(channel = %channel, "Alert bridge attached");
        Self {
            subscription,
            worker,
        }
    }

    pub fn channel(&self) -> &str {
        self.subscription.channel()
    }

    /// Unsubscribe and wait for queued alerts to be delivered
    pub async fn detach(self) {
        let Self {
            subscription,
            worker,
        } = self;
        subscription.unsubscribe();
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Alert bridge worker failed");
        }
    }
}

fn parse_command(message: &InboundMessage) -> Option<BridgeCommand> {
    match message.kind.as_str() {
        NEW_ALERT => {
            let mut payload = message.payload.clone();
            // Producers send either `priority` or `severity`, with loose values
            let priority = payload
                .get("priority")
                .or_else(|| payload.get("severity"))
                .and_then(|v| v.as_str())
                .map(AlertPriority::parse_lenient);
            if let (Some(priority), Some(object)) = (priority, payload.as_object_mut()) {
                object.remove("severity");
                object.insert("priority".to_string(), priority.as_str().into());
            }

            match serde_json::from_value::<NewAlert>(payload) {
                Ok(new_alert) => Some(BridgeCommand::Show(new_alert)),
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed alert payload");
                    None
                }
            }
        }
        DISMISS_ALERT => message
            .payload
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|id| id.parse().ok())
            .map(BridgeCommand::Dismiss),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_new_alert_with_severity() {
        let message = InboundMessage::new(
            "alerts",
            NEW_ALERT,
            json!({"title": "Ransomware behaviour", "severity": "CRITICAL", "duration": 0}),
        );

        match parse_command(&message) {
            Some(BridgeCommand::Show(new_alert)) => {
                assert_eq!(new_alert.title, "Ransomware behaviour");
                assert_eq!(new_alert.priority, Some(AlertPriority::Critical));
                assert_eq!(new_alert.duration_ms, Some(0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_priority_defaults_to_normal() {
        let message = InboundMessage::new(
            "alerts",
            NEW_ALERT,
            json!({"title": "x", "priority": "medium"}),
        );
        match parse_command(&message) {
            Some(BridgeCommand::Show(new_alert)) => {
                assert_eq!(new_alert.priority, Some(AlertPriority::Normal))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dismiss() {
        let id = uuid::Uuid::new_v4();
        let message = InboundMessage::new("alerts", DISMISS_ALERT, json!({"id": id.to_string()}));
        assert_eq!(parse_command(&message), Some(BridgeCommand::Dismiss(id)));
    }

    #[test]
    fn test_parse_ignores_other_kinds_and_bad_payloads() {
        assert!(parse_command(&InboundMessage::new("alerts", "stats", json!({}))).is_none());
        assert!(parse_command(&InboundMessage::new("alerts", NEW_ALERT, json!({"message": "no title"}))).is_none());
        assert!(parse_command(&InboundMessage::new("alerts", DISMISS_ALERT, json!({"id": "nope"}))).is_none());
    }
}
