pub mod alert_bridge;
pub mod alert_center;
pub mod alert_queue;
pub mod context;
pub mod settings_store;
pub mod sound;

pub use alert_bridge::AlertBridge;
pub use alert_center::{AlertCenter, AlertSnapshot};
pub use alert_queue::{AlertQueue, CapacityChange, Placement, QueueMetrics};
pub use context::AppContext;
pub use settings_store::{load_or_default, JsonFileStore, MemoryStore, SettingsStore};
pub use sound::{NullSoundPlayer, SoundPlayer, TracingSoundPlayer};
