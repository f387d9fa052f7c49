pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod realtime;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use realtime::{ChannelRegistry, ConnectionState, ConnectionTracker, OutboundSender};
pub use services::{AlertBridge, AlertCenter, AppContext};
