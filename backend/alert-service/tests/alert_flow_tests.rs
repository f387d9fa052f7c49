/// End-to-end alert flow through the application context
///
/// Covers:
/// - Producer messages on the alerts channel reaching the alert center
/// - Priority promotion when toast slots free up
/// - Auto-dismiss timing under a paused clock
/// - Settings surviving a restart through the JSON file store
use alert_service::models::{AlertPriority, AlertSettings, SettingsUpdate};
use alert_service::realtime::{AlertEvent, ChannelTransport, InboundMessage, RemovalReason};
use alert_service::services::{
    alert_bridge::{DISMISS_ALERT, NEW_ALERT},
    load_or_default, JsonFileStore, MemoryStore, NullSoundPlayer, SettingsStore,
};
use alert_service::{AlertBridge, AppContext};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn context_with(store: Arc<dyn SettingsStore>) -> AppContext {
    let settings = load_or_default(store.as_ref());
    let (transport, _rx) = ChannelTransport::pair();
    AppContext::new(settings, store, Arc::new(NullSoundPlayer), Arc::new(transport))
}

fn context() -> AppContext {
    context_with(Arc::new(MemoryStore::new()))
}

fn publish(ctx: &AppContext, kind: &str, payload: serde_json::Value) -> usize {
    ctx.channels
        .dispatch(&InboundMessage::new("alerts", kind, payload))
}

async fn next_event(events: &mut broadcast::Receiver<AlertEvent>) -> AlertEvent {
    tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("event not published")
        .expect("event channel closed")
}

#[tokio::test(start_paused = true)]
async fn test_producer_alert_is_shown_and_expires() {
    let ctx = context();
    let _bridge = AlertBridge::attach(&ctx, "alerts");
    let mut events = ctx.alerts.subscribe_events();

    let handled = publish(
        &ctx,
        NEW_ALERT,
        json!({"title": "Suspicious login", "severity": "warning", "duration": 2000}),
    );
    assert_eq!(handled, 1);

    let shown = match next_event(&mut events).await {
        AlertEvent::Shown { alert } => alert,
        other => panic!("expected Shown, got {:?}", other),
    };
    assert_eq!(shown.priority, AlertPriority::High);
    assert_eq!(shown.duration_ms, 2000);
    let shown_at = tokio::time::Instant::now();

    match next_event(&mut events).await {
        AlertEvent::Removed { id, reason } => {
            assert_eq!(id, shown.id);
            assert_eq!(reason, RemovalReason::Expired);
        }
        other => panic!("expected Removed, got {:?}", other),
    }
    assert!(shown_at.elapsed() >= Duration::from_millis(2000));
    assert!(ctx.alerts.visible().await.is_empty());
    assert_eq!(ctx.alerts.outstanding_timers().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_critical_producer_alert_overtakes_backlog() {
    let ctx = context();
    let _bridge = AlertBridge::attach(&ctx, "alerts");
    let mut events = ctx.alerts.subscribe_events();

    for i in 0..5 {
        publish(
            &ctx,
            NEW_ALERT,
            json!({"title": format!("Port scan {}", i), "priority": "info"}),
        );
    }
    publish(&ctx, NEW_ALERT, json!({"title": "Ransomware", "priority": "low"}));
    publish(&ctx, NEW_ALERT, json!({"title": "Domain admin added", "severity": "critical"}));

    let mut first_low = None;
    for _ in 0..7 {
        match next_event(&mut events).await {
            AlertEvent::Shown { alert } => {
                first_low.get_or_insert(alert.id);
            }
            AlertEvent::Queued { .. } => {}
            other => panic!("unexpected event {:?}", other),
        }
    }

    let snapshot = ctx.alerts.snapshot().await;
    assert_eq!(snapshot.toast_count, 5);
    assert_eq!(snapshot.pending[0].title, "Domain admin added");
    assert_eq!(snapshot.pending[1].title, "Ransomware");

    let first_low = first_low.unwrap();
    publish(&ctx, DISMISS_ALERT, json!({"id": first_low.to_string()}));

    assert!(matches!(
        next_event(&mut events).await,
        AlertEvent::Removed { reason: RemovalReason::Dismissed, .. }
    ));
    match next_event(&mut events).await {
        AlertEvent::Shown { alert } => {
            assert_eq!(alert.title, "Domain admin added");
            assert_eq!(alert.priority, AlertPriority::Critical);
        }
        other => panic!("expected Shown, got {:?}", other),
    }
    assert_eq!(ctx.alerts.pending().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_detached_bridge_ignores_producers() {
    let ctx = context();
    let bridge = AlertBridge::attach(&ctx, "alerts");
    assert_eq!(bridge.channel(), "alerts");
    bridge.detach().await;

    assert_eq!(publish(&ctx, NEW_ALERT, json!({"title": "late"})), 0);
    assert!(ctx.channels.channels().is_empty());
    assert!(ctx.alerts.visible().await.is_empty());
}

#[tokio::test]
async fn test_settings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs").join("alert-settings.json");

    let ctx = context_with(Arc::new(JsonFileStore::new(&path)));
    assert_eq!(ctx.alerts.settings().await, AlertSettings::default());
    ctx.alerts
        .update_settings(SettingsUpdate {
            max_toasts: Some(2),
            sound_volume: Some(0.8),
            ..Default::default()
        })
        .await
        .unwrap();
    drop(ctx);

    let restarted = context_with(Arc::new(JsonFileStore::new(&path)));
    let settings = restarted.alerts.settings().await;
    assert_eq!(settings.max_toasts, 2);
    assert_eq!(settings.sound_volume, 0.8);
    assert_eq!(restarted.alerts.snapshot().await.max_toasts, 2);
}
