/// Realtime connection plumbing
///
/// Architecture:
/// 1. ConnectionTracker: reflects the transport lifecycle and latency
/// 2. ChannelRegistry: routes inbound messages to channel handlers
/// 3. OutboundSender: assigns message ids and hands messages to the transport
/// 4. Transport: delivery seam, backed by the websocket client in production

pub mod connection;
pub mod messages;
pub mod registry;
pub mod sender;
pub mod transport;
pub mod websocket;

pub use connection::{ConnectionMetrics, ConnectionState, ConnectionTracker, TransportErrorEvent};
pub use messages::{AlertEvent, InboundMessage, MessageId, OutboundMessage, RemovalReason};
pub use registry::{ChannelRegistry, Subscription};
pub use sender::OutboundSender;
pub use transport::{ChannelTransport, Transport, TransportError};
