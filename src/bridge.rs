//! Station bridge with statum lifecycle
//!
//! Composes the connection manager, router and telemetry encoder around one
//! owned transport and the live [`StatusSnapshot`].
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Running ──► Stopped
//!                     │
//!                     └──► RestartRequired (error, process exits)
//! ```
//!
//! # Tick
//!
//! ```text
//! tick(now) ──► ConnectionManager (reconnect, ceiling, receive pass, keepalive)
//!                   │ on connect: subscribe + welcome
//!                   ▼
//!               inbound ──► TopicRouter::dispatch ──► RadioController / snapshot
//!                   ▼
//!               periodic sysinfo
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use statum::{machine, state};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigProvider, TimingConfig};
use crate::error::BridgeError;
use crate::mqtt::connection::{ConnectionManager, ConnectionSettings, ConnectionState, TickOutcome};
use crate::mqtt::router::TopicRouter;
use crate::mqtt::transport::Transport;
use crate::radio::RadioController;
use crate::status::StatusSnapshot;
use crate::telemetry::{Outbound, TelemetryEncoder, TelemetryError};

#[state]
#[derive(Debug, Clone)]
pub enum BridgeState {
    Initializing, // Collaborators wired, no connection yet
    Running,      // Ticking
    Stopped,      // Loop left on shutdown
}

#[machine]
pub struct Bridge<S: BridgeState> {
    transport: Box<dyn Transport>,
    connection: ConnectionManager,
    router: TopicRouter,
    encoder: TelemetryEncoder,
    status: StatusSnapshot,
    tick_interval: Duration,
    sysinfo_interval: Option<Duration>,
    last_sysinfo: Option<Instant>,
}

impl<S: BridgeState> Bridge<S> {
    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    pub fn connection_state(&self) -> &ConnectionState {
        self.connection.state()
    }
}

impl Bridge<Initializing> {
    pub fn create(
        config: Arc<dyn ConfigProvider>,
        timing: &TimingConfig,
        transport: Box<dyn Transport>,
        radio: Box<dyn RadioController>,
        version: &str,
    ) -> Self {
        info!(
            "Initializing bridge for station '{}' (firmware {})",
            config.thing_name(),
            version
        );
        let settings = ConnectionSettings::from(timing);
        debug!("Connection settings: {:?}", settings);

        Self::new(
            transport,
            ConnectionManager::new(config.clone(), settings),
            TopicRouter::new(config.clone(), radio),
            TelemetryEncoder::new(config),
            StatusSnapshot::new(version),
            timing.tick_interval(),
            timing.sysinfo_interval(),
            None, // last_sysinfo
        )
    }

    pub fn start(self) -> Bridge<Running> {
        info!("Bridge running");
        self.transition()
    }
}

impl Bridge<Running> {
    /// Writable view for the radio and power drivers feeding telemetry
    pub fn status_mut(&mut self) -> &mut StatusSnapshot {
        &mut self.status
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let router = &self.router;
        let encoder = &self.encoder;
        let status = &self.status;

        let report = self
            .connection
            .tick(now, self.transport.as_mut(), |transport| {
                router.subscribe_to_all(transport);
                let welcome = encoder
                    .encode_welcome(status)
                    .and_then(|outbound| encoder.publish(transport, &outbound));
                if let Err(e) = welcome {
                    warn!("Welcome dropped: {}", e);
                }
            });

        if report.outcome != TickOutcome::Running {
            return report.outcome;
        }

        for message in report.inbound {
            debug!("Received {}", message);
            let outcome = self
                .router
                .dispatch(&message.topic, &message.payload, &mut self.status);
            if let Some(reason) = outcome.restart {
                return TickOutcome::Restart(reason);
            }
        }

        self.periodic_system_info(now);
        TickOutcome::Running
    }

    fn periodic_system_info(&mut self, now: Instant) {
        let Some(interval) = self.sysinfo_interval else {
            return;
        };
        if !self.connection.state().is_connected {
            return;
        }
        let due = match self.last_sysinfo {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        };
        if due {
            self.last_sysinfo = Some(now);
            if let Err(e) = self.send_system_info() {
                warn!("System info dropped: {}", e);
            }
        }
    }

    fn send(&mut self, outbound: Result<Outbound, TelemetryError>) -> Result<(), BridgeError> {
        let outbound = outbound?;
        self.encoder.publish(self.transport.as_mut(), &outbound)?;
        Ok(())
    }

    pub fn send_system_info(&mut self) -> Result<(), BridgeError> {
        let outbound = self.encoder.encode_system_info(&self.status);
        self.send(outbound)
    }

    pub fn send_pong(&mut self) -> Result<(), BridgeError> {
        let outbound = self.encoder.encode_pong(&self.status);
        self.send(outbound)
    }

    /// Relays a frame received by the radio to `msg` or `miniTTN`.
    pub fn send_message(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        let outbound = self.encoder.encode_message(&self.status, frame);
        self.send(outbound)
    }

    pub fn send_raw_packet(&mut self, packet: &str) -> Result<(), BridgeError> {
        let outbound = self.encoder.encode_raw_packet(&self.status, packet);
        self.send(outbound)
    }

    /// Ticks until `shutdown` is cancelled or a restart is required.
    ///
    /// Blocks the calling thread; run it off the async runtime.
    pub fn run_until_shutdown(
        mut self,
        shutdown: CancellationToken,
    ) -> Result<Bridge<Stopped>, BridgeError> {
        info!("Starting bridge loop every {:?}", self.tick_interval);

        while !shutdown.is_cancelled() {
            match self.tick(Instant::now()) {
                TickOutcome::Running => {}
                TickOutcome::Restart(reason) => {
                    error!("Restart required: {:?}", reason);
                    return Err(BridgeError::RestartRequired(reason));
                }
                TickOutcome::Halted => return Err(BridgeError::Halted),
            }
            std::thread::sleep(self.tick_interval);
        }

        info!("Shutdown received, leaving bridge loop");
        Ok(self.transition())
    }
}

impl Bridge<Stopped> {
    pub fn into_status(self) -> StatusSnapshot {
        self.status
    }
}
