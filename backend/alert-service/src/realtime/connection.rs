/// Connection State Tracker
///
/// Reflects the lifecycle reported by the transport and keeps a rolling
/// latency sample. It never drives reconnects itself.
use crate::error::{AppError, Result};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Number of latency samples kept for the rolling average
pub const LATENCY_WINDOW: usize = 20;

const ERROR_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (*self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Disconnected)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of connection health
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConnectionMetrics {
    pub state: ConnectionState,
    pub latency_ms: Option<u64>,
    pub average_latency_ms: Option<u64>,
    pub samples: usize,
    pub reconnects: u64,
    pub connected_since: Option<DateTime<Utc>>,
}

/// Error reported by the transport to registered listeners
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransportErrorEvent {
    pub state: ConnectionState,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct Details {
    latencies: VecDeque<Duration>,
    reconnects: u64,
    connected_since: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ConnectionTracker {
    state: Arc<watch::Sender<ConnectionState>>,
    details: Arc<watch::Sender<Details>>,
    errors: broadcast::Sender<TransportErrorEvent>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (details, _) = watch::channel(Details::default());
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(state),
            details: Arc::new(details),
            errors,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Apply a state reported by the transport
    ///
    /// Reporting the current state again is a no-op.
    pub fn transition(&self, next: ConnectionState) -> Result<ConnectionState> {
        let mut previous = next;
        let mut rejected = false;
        let changed = self.state.send_if_modified(|state| {
            previous = *state;
            if previous == next {
                return false;
            }
            if !previous.can_transition_to(next) {
                rejected = true;
                return false;
            }
            *state = next;
            true
        });

        if rejected {
            tracing::warn!(from = %previous, to = %next, "Rejected connection transition");
            return Err(AppError::InvalidTransition {
                from: previous,
                to: next,
            });
        }
        if !changed {
            return Ok(next);
        }

        self.details.send_modify(|details| {
            if previous == ConnectionState::Reconnecting && next == ConnectionState::Connected {
                details.reconnects += 1;
            }
            details.connected_since = match next {
                ConnectionState::Connected => Some(Utc::now()),
                _ => None,
            };
            if next == ConnectionState::Disconnected {
                details.latencies.clear();
            }
        });

        tracing::info!(from = %previous, to = %next, "Connection state changed");
        Ok(next)
    }

    /// Add a round-trip sample to the rolling window
    pub fn record_latency(&self, latency: Duration) {
        self.details.send_modify(|details| {
            if details.latencies.len() == LATENCY_WINDOW {
                details.latencies.pop_front();
            }
            details.latencies.push_back(latency);
        });
        metrics::observe_connection_latency(latency);
    }

    pub fn metrics(&self) -> ConnectionMetrics {
        let state = self.state();
        let details = self.details.borrow();
        let samples = details.latencies.len();
        let average_latency_ms = if samples == 0 {
            None
        } else {
            let total: Duration = details.latencies.iter().sum();
            Some((total / samples as u32).as_millis() as u64)
        };

        ConnectionMetrics {
            state,
            latency_ms: details.latencies.back().map(|d| d.as_millis() as u64),
            average_latency_ms,
            samples,
            reconnects: details.reconnects,
            connected_since: details.connected_since,
        }
    }

    /// Receiver that observes every state change
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Notify error listeners
    pub fn report_error(&self, message: impl Into<String>) {
        let event = TransportErrorEvent {
            state: self.state(),
            message: message.into(),
            at: Utc::now(),
        };
        tracing::warn!(state = %event.state, error = %event.message, "Transport error");
        // No listeners is fine
        let _ = self.errors.send(event);
    }

    /// Register an error listener
    pub fn subscribe_errors(&self) -> broadcast::Receiver<TransportErrorEvent> {
        self.errors.subscribe()
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
