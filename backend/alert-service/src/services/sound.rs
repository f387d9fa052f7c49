/// Sound cue collaborator
///
/// Playback is fire-and-forget and never blocks alert delivery.
use crate::models::Alert;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub trait SoundPlayer: Send + Sync {
    fn play(&self, alert: &Alert);
    fn set_enabled(&self, enabled: bool);
    fn set_volume(&self, volume: f32);
}

/// Server-side player that records cues in the log
#[derive(Debug)]
pub struct TracingSoundPlayer {
    enabled: AtomicBool,
    volume_bits: AtomicU32,
}

impl TracingSoundPlayer {
    pub fn new(enabled: bool, volume: f32) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            volume_bits: AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }
}

impl Default for TracingSoundPlayer {
    fn default() -> Self {
        Self::new(true, 0.5)
    }
}

impl SoundPlayer for TracingSoundPlayer {
    fn play(&self, alert: &Alert) {
        if !self.is_enabled() {
            return;
        }
        if let Some(cue) = alert.sound {
            tracing::info!(
                alert_id = %alert.id,
                cue = cue.as_str(),
                volume = self.volume(),
                "Playing alert sound"
            );
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

/// Player for headless deployments
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSoundPlayer;

impl SoundPlayer for NullSoundPlayer {
    fn play(&self, _alert: &Alert) {}
    fn set_enabled(&self, _enabled: bool) {}
    fn set_volume(&self, _volume: f32) {}
}
