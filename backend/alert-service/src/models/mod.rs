use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AlertId = Uuid;

/// Display duration used when neither the alert nor the settings give one.
pub const DEFAULT_DURATION_MS: u64 = 5000;

/// Default number of simultaneously visible toasts.
pub const DEFAULT_MAX_TOASTS: usize = 5;

/// Alert priority level
///
/// Ordering follows release order: `Critical` sorts first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    /// Active incident, always released first
    Critical,
    /// Needs attention soon
    High,
    /// Standard delivery
    Normal,
    /// Informational
    Low,
}

impl AlertPriority {
    /// Rank used by the pending queue (critical=0 ... low=3)
    pub fn rank(&self) -> u8 {
        match self {
            AlertPriority::Critical => 0,
            AlertPriority::High => 1,
            AlertPriority::Normal => 2,
            AlertPriority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Critical => "critical",
            AlertPriority::High => "high",
            AlertPriority::Normal => "normal",
            AlertPriority::Low => "low",
        }
    }

    /// Lenient parse used for inbound payloads; unknown values map to `Normal`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "critical" | "error" => AlertPriority::Critical,
            "high" | "warning" => AlertPriority::High,
            "low" | "info" => AlertPriority::Low,
            _ => AlertPriority::Normal,
        }
    }
}

impl Default for AlertPriority {
    fn default() -> Self {
        AlertPriority::Normal
    }
}

/// Alert lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Waiting for a free toast slot
    Queued,
    /// Currently shown
    Visible,
    /// Removed by the user
    Dismissed,
    /// Removed by its auto-dismiss timer
    Expired,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Queued => "queued",
            AlertStatus::Visible => "visible",
            AlertStatus::Dismissed => "dismissed",
            AlertStatus::Expired => "expired",
        }
    }
}

/// Sound played when an alert becomes visible
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    Chime,
    Alarm,
    Beep,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Chime => "chime",
            SoundCue::Alarm => "alarm",
            SoundCue::Beep => "beep",
        }
    }
}

/// A toast or banner tracked by the alert center
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: AlertId,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    /// Auto-dismiss delay in milliseconds; 0 keeps the alert until dismissed
    pub duration_ms: u64,
    pub persist: bool,
    pub dismissible: bool,
    pub read: bool,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundCue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Alert {
    /// Banners never auto-dismiss and do not occupy a toast slot.
    pub fn is_persistent(&self) -> bool {
        self.persist || self.duration_ms == 0
    }
}

/// Producer request for a new alert
///
/// Missing fields are filled from [`AlertSettings`] without validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewAlert {
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<AlertPriority>,
    #[serde(default, alias = "duration")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub persist: Option<bool>,
    #[serde(default)]
    pub dismissible: Option<bool>,
    #[serde(default)]
    pub sound: Option<SoundCue>,
    #[serde(default)]
    pub source: Option<String>,
}

impl NewAlert {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn priority(mut self, priority: AlertPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persist = Some(true);
        self.duration_ms = Some(0);
        self
    }

    pub fn sound(mut self, sound: SoundCue) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Resolve into an [`Alert`] with a fresh id and creation timestamp.
    pub fn into_alert(self, settings: &AlertSettings) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            priority: self.priority.unwrap_or_default(),
            title: self.title,
            message: self.message.unwrap_or_default(),
            duration_ms: self.duration_ms.unwrap_or(settings.default_duration_ms),
            persist: self.persist.unwrap_or(false),
            dismissible: self.dismissible.unwrap_or(true),
            read: false,
            status: AlertStatus::Queued,
            created_at: Utc::now(),
            sound: self.sound,
            source: self.source,
        }
    }
}

/// Where the dashboard renders toasts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
    TopCenter,
    BottomCenter,
}

/// User display preferences, persisted as one flat JSON object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    pub sound_enabled: bool,
    pub position: ToastPosition,
    pub max_toasts: usize,
    #[serde(rename = "defaultDuration")]
    pub default_duration_ms: u64,
    pub sound_volume: f32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            position: ToastPosition::TopRight,
            max_toasts: DEFAULT_MAX_TOASTS,
            default_duration_ms: DEFAULT_DURATION_MS,
            sound_volume: 0.5,
        }
    }
}

impl AlertSettings {
    /// Clamp values into their valid ranges: volume in 0..=1, at least one toast slot.
    pub fn normalized(mut self) -> Self {
        self.max_toasts = self.max_toasts.max(1);
        self.sound_volume = if self.sound_volume.is_nan() {
            AlertSettings::default().sound_volume
        } else {
            self.sound_volume.clamp(0.0, 1.0)
        };
        self
    }
}

/// Partial settings change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub sound_enabled: Option<bool>,
    pub position: Option<ToastPosition>,
    pub max_toasts: Option<usize>,
    #[serde(rename = "defaultDuration")]
    pub default_duration_ms: Option<u64>,
    pub sound_volume: Option<f32>,
}

impl SettingsUpdate {
    /// Returns a new settings value with only the supplied fields changed,
    /// normalized like loaded settings.
    pub fn apply(&self, current: &AlertSettings) -> AlertSettings {
        let mut next = current.clone();
        if let Some(sound_enabled) = self.sound_enabled {
            next.sound_enabled = sound_enabled;
        }
        if let Some(position) = self.position {
            next.position = position;
        }
        if let Some(max_toasts) = self.max_toasts {
            next.max_toasts = max_toasts;
        }
        if let Some(default_duration_ms) = self.default_duration_ms {
            next.default_duration_ms = default_duration_ms;
        }
        if let Some(sound_volume) = self.sound_volume {
            next.sound_volume = sound_volume;
        }
        next.normalized()
    }
}
