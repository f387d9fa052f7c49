use super::alert_center::AlertCenter;
use super::settings_store::SettingsStore;
use super::sound::SoundPlayer;
use crate::models::AlertSettings;
use crate::realtime::{ChannelRegistry, ConnectionTracker, OutboundSender, Transport};
use std::sync::Arc;

/// Everything the handlers and the transport share
///
/// Built once at startup and passed down explicitly; tests build their own.
#[derive(Clone)]
pub struct AppContext {
    pub alerts: AlertCenter,
    pub connection: ConnectionTracker,
    pub channels: ChannelRegistry,
    pub sender: OutboundSender,
}

impl AppContext {
    pub fn new(
        settings: AlertSettings,
        store: Arc<dyn SettingsStore>,
        sound: Arc<dyn SoundPlayer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let connection = ConnectionTracker::new();
        Self {
            alerts: AlertCenter::new(settings, store, sound),
            sender: OutboundSender::new(connection.clone(), transport),
            channels: ChannelRegistry::new(),
            connection,
        }
    }
}
