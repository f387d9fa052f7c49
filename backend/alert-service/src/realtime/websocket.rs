/// WebSocket client transport
///
/// Connects to the upstream realtime endpoint and:
/// 1. Reports lifecycle changes to the ConnectionTracker
/// 2. Dispatches inbound text frames through the ChannelRegistry
/// 3. Writes OutboundMessages queued by the OutboundSender
/// 4. Measures latency with ping/pong
/// 5. Reconnects with a fixed delay until the attempt limit is reached
use super::{ChannelRegistry, ConnectionState, ConnectionTracker, InboundMessage, OutboundMessage};
use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WebSocketClientConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    /// Consecutive failed attempts before giving up; 0 retries forever
    pub max_reconnect_attempts: u32,
    pub ping_interval: Duration,
}

enum SessionEnd {
    /// Remote closed or the socket failed
    Lost,
    /// Every outbound sender was dropped
    Shutdown,
}

/// Start the client loop on the current runtime
pub fn spawn_client(
    config: WebSocketClientConfig,
    tracker: ConnectionTracker,
    registry: ChannelRegistry,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(run_client(config, tracker, registry, outbound_rx))
}

async fn run_client(
    config: WebSocketClientConfig,
    tracker: ConnectionTracker,
    registry: ChannelRegistry,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
) {
    let mut failures: u32 = 0;
    report(&tracker, ConnectionState::Connecting);

    loop {
        tracing::info!(url = %config.url, attempt = failures + 1, "Connecting to realtime endpoint");

        match connect_async(config.url.as_str()).await {
            Ok((socket, _)) => {
                failures = 0;
                report(&tracker, ConnectionState::Connected);

                match run_session(socket, &config, &tracker, &registry, &mut outbound_rx).await {
                    SessionEnd::Shutdown => {
                        report(&tracker, ConnectionState::Disconnected);
                        tracing::info!("Realtime client shut down");
                        return;
                    }
                    SessionEnd::Lost => report(&tracker, ConnectionState::Reconnecting),
                }
            }
            Err(e) => {
                failures += 1;
                tracker.report_error(format!("connect failed: {}", e));

                if config.max_reconnect_attempts > 0 && failures >= config.max_reconnect_attempts {
                    tracing::error!(
                        attempts = failures,
                        "Giving up on realtime endpoint"
                    );
                    report(&tracker, ConnectionState::Disconnected);
                    return;
                }
            }
        }

        tokio::time::sleep(config.reconnect_delay).await;
    }
}

async fn run_session(
    socket: Socket,
    config: &WebSocketClientConfig,
    tracker: &ConnectionTracker,
    registry: &ChannelRegistry,
    outbound_rx: &mut mpsc::UnboundedReceiver<OutboundMessage>,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();
    let mut ping = tokio::time::interval(config.ping_interval);
    let mut ping_sent: Option<Instant> = None;

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match InboundMessage::from_json(&text) {
                    Ok(message) => {
                        registry.dispatch(&message);
                    }
                    Err(e) => tracing::warn!(error = %e, "Discarding malformed inbound frame"),
                },
                Some(Ok(Message::Pong(_))) => {
                    if let Some(sent) = ping_sent.take() {
                        tracker.record_latency(sent.elapsed());
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Realtime endpoint closed the connection");
                    return SessionEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracker.report_error(e.to_string());
                    return SessionEnd::Lost;
                }
                None => return SessionEnd::Lost,
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(message) => {
                    let json = match message.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(message_id = %message.id, error = %e, "Failed to encode outbound message");
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(json)).await {
                        tracker.report_error(e.to_string());
                        return SessionEnd::Lost;
                    }
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            },
            _ = ping.tick() => {
                ping_sent = Some(Instant::now());
                if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                    tracker.report_error(e.to_string());
                    return SessionEnd::Lost;
                }
            }
        }
    }
}

fn report(tracker: &ConnectionTracker, state: ConnectionState) {
    if let Err(e) = tracker.transition(state) {
        tracing::warn!(error = %e, "Unexpected transport state report");
    }
}
