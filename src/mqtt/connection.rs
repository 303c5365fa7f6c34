//! Broker connection lifecycle
//!
//! ```text
//!            interval elapsed             transport connected
//! Disconnected ──────────────► attempt ─────────────────────► Connected
//!      ▲                          │ failed (count += 1)            │
//!      └──────────────────────────┘                                │
//!      └───────────────────────────── link lost ───────────────────┘
//!
//! count > connection_timeout ──► restart signalled once, manager goes inert
//! ```
//!
//! Attempts are spaced by a fixed interval rather than an exponential backoff.
//! The failure counter only moves while attempts are actually being made, and
//! resets as soon as the transport reports a live session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::config::ConnectOptions;
use super::message_manager::InboundMessage;
use super::router::RestartReason;
use super::topics::{build_topic, leaf};
use super::transport::Transport;
use crate::config::{ConfigProvider, TimingConfig};

/// Marker published on the ping leaf
pub const KEEPALIVE_PAYLOAD: &[u8] = b"1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub reconnection_interval: Duration,
    /// Failed attempts tolerated before a restart is required
    pub connection_timeout: u32,
    pub ping_interval: Duration,
    pub connect_timeout: Duration,
}

impl From<&TimingConfig> for ConnectionSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            reconnection_interval: timing.reconnection_interval(),
            connection_timeout: timing.connection_timeout,
            ping_interval: timing.ping_interval(),
            connect_timeout: timing.connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub last_attempt: Option<Instant>,
    pub consecutive_failed_attempts: u32,
    pub is_connected: bool,
    pub last_keepalive: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Emitted once; the process has to restart
    Restart(RestartReason),
    /// A restart was already signalled, nothing was done
    Halted,
}

#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Publishes received during this tick's transport pass
    pub inbound: Vec<InboundMessage>,
    /// A session was established during this tick
    pub reconnected: bool,
}

pub struct ConnectionManager {
    config: Arc<dyn ConfigProvider>,
    settings: ConnectionSettings,
    state: ConnectionState,
    restart_signalled: bool,
}

impl ConnectionManager {
    pub fn new(config: Arc<dyn ConfigProvider>, settings: ConnectionSettings) -> Self {
        Self {
            config,
            settings,
            state: ConnectionState::default(),
            restart_signalled: false,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// One pass of the lifecycle: reconnect if due, check the attempt
    /// ceiling, run the transport's receive pass, then keepalive.
    ///
    /// `on_connect` runs right after a session is established, before any
    /// inbound message is read.
    pub fn tick<F>(&mut self, now: Instant, transport: &mut dyn Transport, on_connect: F) -> TickReport
    where
        F: FnOnce(&mut dyn Transport),
    {
        if self.restart_signalled {
            return TickReport {
                outcome: TickOutcome::Halted,
                inbound: Vec::new(),
                reconnected: false,
            };
        }

        let reconnected = self.evaluate_connection(now, transport);
        if reconnected {
            on_connect(&mut *transport);
        }

        if self.state.consecutive_failed_attempts > self.settings.connection_timeout {
            error!(
                "Unable to reach broker after {} attempts, restart required",
                self.state.consecutive_failed_attempts
            );
            self.restart_signalled = true;
            return TickReport {
                outcome: TickOutcome::Restart(RestartReason::ConnectionTimeout {
                    attempts: self.state.consecutive_failed_attempts,
                }),
                inbound: Vec::new(),
                reconnected,
            };
        }

        let inbound = transport.poll();
        if self.state.is_connected && !transport.is_connected() {
            warn!("Broker session dropped");
            self.state.is_connected = false;
        }

        self.keepalive(now, transport);

        TickReport {
            outcome: TickOutcome::Running,
            inbound,
            reconnected,
        }
    }

    /// Returns true when this call established a new session.
    fn evaluate_connection(&mut self, now: Instant, transport: &mut dyn Transport) -> bool {
        if transport.is_connected() {
            self.state.consecutive_failed_attempts = 0;
            self.state.is_connected = true;
            return false;
        }

        self.state.is_connected = false;
        let due = match self.state.last_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.settings.reconnection_interval,
        };
        if !due {
            return false;
        }

        self.state.last_attempt = Some(now);
        self.state.consecutive_failed_attempts += 1;
        info!(
            "Attempting broker connection (attempt {})",
            self.state.consecutive_failed_attempts
        );

        let options = ConnectOptions::from_provider(
            self.config.as_ref(),
            build_topic(self.config.as_ref(), leaf::STATUS),
            self.settings.connect_timeout,
        );
        if let Err(e) = transport.connect(&options) {
            warn!(
                "Broker connection to {}:{} failed: {}",
                options.server, options.port, e
            );
        }

        if transport.is_connected() {
            self.state.consecutive_failed_attempts = 0;
            self.state.is_connected = true;
            true
        } else {
            false
        }
    }

    fn keepalive(&mut self, now: Instant, transport: &mut dyn Transport) {
        let due = match self.state.last_keepalive {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.settings.ping_interval,
        };
        if !due {
            return;
        }

        self.state.last_keepalive = Some(now);
        let topic = build_topic(self.config.as_ref(), leaf::PING);
        match transport.publish(&topic, KEEPALIVE_PAYLOAD) {
            Ok(()) => debug!("Keepalive sent to {}", topic),
            Err(e) => debug!("Keepalive dropped: {}", e),
        }
    }
}
