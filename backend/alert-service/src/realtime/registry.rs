/// Channel Subscription Registry
///
/// Maps channel names to handlers and dispatches inbound messages.
/// Supports:
/// - Multiple handlers per channel, invoked in registration order
/// - Guard-based unsubscription (explicit or on drop)
/// - Snapshot dispatch: changes during a dispatch pass do not affect it
use super::InboundMessage;
use crate::metrics;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked for every message on a channel
pub type Handler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

type SubscriptionId = u64;

struct RegistryInner {
    channels: DashMap<String, Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn remove(&self, channel: &str, id: SubscriptionId) -> bool {
        let mut removed = false;
        if let Some(mut handlers) = self.channels.get_mut(channel) {
            let before = handlers.len();
            handlers.retain(|(handler_id, _)| *handler_id != id);
            removed = handlers.len() != before;
        }
        self.channels.remove_if(channel, |_, handlers| handlers.is_empty());
        removed
    }
}

#[derive(Clone)]
pub struct ChannelRegistry {
    inner: Arc<RegistryInner>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channels: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a handler for `channel`
    ///
    /// The handler stays registered until the returned guard is dropped or
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, channel: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let channel = channel.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .channels
            .entry(channel.clone())
            .or_default()
            .push((id, Arc::new(handler)));

        tracing::debug!(channel = %channel, subscription_id = id, "Handler subscribed");

        Subscription {
            registry: Arc::downgrade(&self.inner),
            channel,
            id,
            active: true,
        }
    }

    /// Invoke every handler registered for `message.channel`
    ///
    /// Returns the number of handlers invoked. The handler list is copied
    /// before the first call, so a handler removed mid-pass may still run
    /// once in that pass.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let snapshot: Vec<Handler> = match self.inner.channels.get(&message.channel) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => Vec::new(),
        };

        metrics::record_dispatch(&message.channel, snapshot.len());
        if snapshot.is_empty() {
            tracing::trace!(channel = %message.channel, "No handlers for channel");
            return 0;
        }

        for handler in &snapshot {
            handler(message);
        }
        snapshot.len()
    }

    pub fn handler_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .get(channel)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Channels with at least one handler
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .inner
            .channels
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        channels.sort();
        channels
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration guard returned by [`ChannelRegistry::subscribe`]
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    channel: String,
    id: SubscriptionId,
    active: bool,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Remove the handler; returns false if it was already gone
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        match self.registry.upgrade() {
            Some(inner) => {
                tracing::debug!(channel = %self.channel, subscription_id = self.id, "Handler unsubscribed");
                inner.remove(&self.channel, self.id)
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
