/// Toast/Banner Lifecycle Manager
///
/// Owns the alert queue, the auto-dismiss timers and the display
/// preferences. Every timer handle is stored and aborted on dismissal,
/// `clear_all` and teardown.
use super::alert_queue::{AlertQueue, Placement};
use super::settings_store::SettingsStore;
use super::sound::SoundPlayer;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Alert, AlertId, AlertSettings, AlertStatus, NewAlert, SettingsUpdate};
use crate::realtime::{AlertEvent, RemovalReason};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::AbortHandle;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Point-in-time view of the alert center
#[derive(Debug, Clone, Serialize)]
pub struct AlertSnapshot {
    pub visible: Vec<Alert>,
    pub pending: Vec<Alert>,
    pub toast_count: usize,
    pub max_toasts: usize,
    pub unread: usize,
}

struct CenterState {
    queue: AlertQueue,
    timers: HashMap<AlertId, AbortHandle>,
    settings: AlertSettings,
}

impl CenterState {
    fn cancel_timer(&mut self, id: AlertId) {
        if let Some(timer) = self.timers.remove(&id) {
            timer.abort();
        }
    }

    fn cancel_all_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

impl Drop for CenterState {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}

struct Inner {
    state: Mutex<CenterState>,
    sound: Arc<dyn SoundPlayer>,
    store: Arc<dyn SettingsStore>,
    events: broadcast::Sender<AlertEvent>,
}

/// Cloneable handle to the alert lifecycle manager
///
/// Auto-dismiss timers are tokio tasks, so alerts must be shown from
/// within a tokio runtime.
#[derive(Clone)]
pub struct AlertCenter {
    inner: Arc<Inner>,
}

impl AlertCenter {
    pub fn new(
        settings: AlertSettings,
        store: Arc<dyn SettingsStore>,
        sound: Arc<dyn SoundPlayer>,
    ) -> Self {
        let settings = settings.normalized();
        sound.set_enabled(settings.sound_enabled);
        sound.set_volume(settings.sound_volume);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CenterState {
                    queue: AlertQueue::new(settings.max_toasts),
                    timers: HashMap::new(),
                    settings,
                }),
                sound,
                store,
                events,
            }),
        }
    }

    /// Accept a new alert, showing it now or queueing it by priority
    pub async fn show_alert(&self, new_alert: NewAlert) -> Alert {
        let mut state = self.inner.state.lock().await;
        let mut alert = new_alert.into_alert(&state.settings);

        let placement = state.queue.enqueue(alert.clone());
        metrics::record_enqueued(
            alert.priority.as_str(),
            match placement {
                Placement::Shown => "shown",
                Placement::Queued => "queued",
            },
        );

        match placement {
            Placement::Shown => {
                alert.status = AlertStatus::Visible;
                self.on_shown(&mut state, &alert);
            }
            Placement::Queued => {
                alert.status = AlertStatus::Queued;
                tracing::debug!(
                    alert_id = %alert.id,
                    priority = alert.priority.as_str(),
                    pending = state.queue.pending_len(),
                    "Alert queued, toast slots full"
                );
                self.publish(AlertEvent::Queued {
                    alert: alert.clone(),
                });
            }
        }

        update_gauges(&state);
        alert
    }

    /// Explicit dismissal; unknown ids are a no-op
    pub async fn dismiss(&self, id: AlertId) -> Option<Alert> {
        let mut state = self.inner.state.lock().await;
        self.remove_locked(&mut state, id, RemovalReason::Dismissed)
    }

    pub async fn mark_as_read(&self, id: AlertId) -> bool {
        let mut state = self.inner.state.lock().await;
        let found = state.queue.mark_read(id);
        if found {
            self.publish(AlertEvent::Read { id });
        }
        found
    }

    /// Returns how many alerts changed
    pub async fn mark_all_as_read(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let count = state.queue.mark_all_read();
        if count > 0 {
            self.publish(AlertEvent::AllRead { count });
        }
        count
    }

    /// Drop every visible and pending alert and cancel all timers
    pub async fn clear_all(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        state.cancel_all_timers();
        let cleared = state.queue.clear();

        for _ in &cleared {
            metrics::record_removed(RemovalReason::Cleared.as_str());
        }
        tracing::info!(count = cleared.len(), "Cleared all alerts");
        self.publish(AlertEvent::Cleared {
            count: cleared.len(),
        });

        update_gauges(&state);
        cleared.len()
    }

    pub async fn get(&self, id: AlertId) -> Option<Alert> {
        self.inner.state.lock().await.queue.get(id).cloned()
    }

    pub async fn visible(&self) -> Vec<Alert> {
        self.inner.state.lock().await.queue.visible()
    }

    pub async fn pending(&self) -> Vec<Alert> {
        self.inner.state.lock().await.queue.pending()
    }

    pub async fn snapshot(&self) -> AlertSnapshot {
        let state = self.inner.state.lock().await;
        let visible = state.queue.visible();
        let pending = state.queue.pending();
        let unread = visible.iter().chain(pending.iter()).filter(|a| !a.read).count();

        AlertSnapshot {
            toast_count: state.queue.toast_count(),
            max_toasts: state.queue.capacity(),
            visible,
            pending,
            unread,
        }
    }

    /// Number of auto-dismiss timers still armed
    pub async fn outstanding_timers(&self) -> usize {
        self.inner.state.lock().await.timers.len()
    }

    pub async fn settings(&self) -> AlertSettings {
        self.inner.state.lock().await.settings.clone()
    }

    /// Apply and persist a preference change
    ///
    /// The store write runs on the blocking pool; the in-memory settings are
    /// only replaced once the store accepted them.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<AlertSettings> {
        let mut state = self.inner.state.lock().await;
        let next = update.apply(&state.settings);

        // The lock stays held so saves land in update order
        let store = Arc::clone(&self.inner.store);
        let to_save = next.clone();
        tokio::task::spawn_blocking(move || store.save(&to_save))
            .await
            .map_err(|e| AppError::Store(format!("settings save task failed: {}", e)))??;

        self.inner.sound.set_enabled(next.sound_enabled);
        self.inner.sound.set_volume(next.sound_volume);

        let capacity_changed = next.max_toasts != state.settings.max_toasts;
        state.settings = next.clone();

        if capacity_changed {
            let change = state.queue.set_capacity(next.max_toasts);
            for alert in change.demoted {
                state.cancel_timer(alert.id);
                self.publish(AlertEvent::Queued { alert });
            }
            for alert in change.promoted {
                self.on_shown(&mut state, &alert);
            }
            tracing::info!(max_toasts = next.max_toasts, "Toast capacity changed");
        }

        update_gauges(&state);
        Ok(next)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AlertEvent> {
        self.inner.events.subscribe()
    }

    fn on_shown(&self, state: &mut CenterState, alert: &Alert) {
        if !alert.is_persistent() {
            self.start_timer(state, alert.id, Duration::from_millis(alert.duration_ms));
        }
        if state.settings.sound_enabled {
            self.inner.sound.play(alert);
        }

        tracing::debug!(
            alert_id = %alert.id,
            priority = alert.priority.as_str(),
            persistent = alert.is_persistent(),
            "Alert shown"
        );
        self.publish(AlertEvent::Shown {
            alert: alert.clone(),
        });
    }

    fn start_timer(&self, state: &mut CenterState, id: AlertId, duration: Duration) {
        let center: Weak<Inner> = Arc::downgrade(&self.inner);
        let deadline = tokio::time::Instant::now() + duration;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = center.upgrade() {
                AlertCenter { inner }.expire(id).await;
            }
        });

        if let Some(previous) = state.timers.insert(id, task.abort_handle()) {
            previous.abort();
        }
    }

    async fn expire(&self, id: AlertId) {
        let mut state = self.inner.state.lock().await;
        // This task is the timer; forget it without aborting
        if state.timers.remove(&id).is_none() {
            return;
        }
        if self.remove_locked(&mut state, id, RemovalReason::Expired).is_some() {
            tracing::debug!(alert_id = %id, "Alert expired");
        }
    }

    fn remove_locked(
        &self,
        state: &mut CenterState,
        id: AlertId,
        reason: RemovalReason,
    ) -> Option<Alert> {
        let mut alert = state.queue.remove(id)?;
        state.cancel_timer(id);
        alert.status = match reason {
            RemovalReason::Expired => AlertStatus::Expired,
            RemovalReason::Dismissed | RemovalReason::Cleared => AlertStatus::Dismissed,
        };

        metrics::record_removed(reason.as_str());
        self.publish(AlertEvent::Removed { id, reason });

        for promoted in state.queue.release_all() {
            self.on_shown(state, &promoted);
        }

        update_gauges(state);
        Some(alert)
    }

    fn publish(&self, event: AlertEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

fn update_gauges(state: &CenterState) {
    metrics::set_queue_sizes(state.queue.visible_len(), state.queue.pending_len());
}
