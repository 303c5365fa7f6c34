//! Inbound topic dispatch
//!
//! The route table is built once from the station namespace when the router
//! is constructed. Dispatch evaluates every route on its own, so a topic that
//! matches several routes runs all of them, and a topic that matches none is
//! ignored.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::topics::{build_topic, leaf, remote_topic, RemoteCommand, GLOBAL_SAT_POS};
use super::transport::Transport;
use crate::config::ConfigProvider;
use crate::radio::{RadioController, RadioError};
use crate::status::StatusSnapshot;

/// Largest satellite position payload accepted for parsing
pub const MAX_SAT_POS_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Remote(RemoteCommand),
    SatellitePosition,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRoute {
    pub topic: String,
    pub action: RouteAction,
}

/// Why the process has to restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    RemoteReset,
    ConnectionTimeout { attempts: u32 },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of routes that matched
    pub matched: usize,
    pub restart: Option<RestartReason>,
}

pub struct TopicRouter {
    config: Arc<dyn ConfigProvider>,
    radio: Box<dyn RadioController>,
    routes: Vec<CommandRoute>,
}

impl TopicRouter {
    pub fn new(config: Arc<dyn ConfigProvider>, radio: Box<dyn RadioController>) -> Self {
        let mut routes = vec![CommandRoute {
            topic: GLOBAL_SAT_POS.to_string(),
            action: RouteAction::SatellitePosition,
        }];
        routes.extend(RemoteCommand::ALL.iter().map(|command| CommandRoute {
            topic: remote_topic(config.as_ref(), *command),
            action: RouteAction::Remote(*command),
        }));
        routes.push(CommandRoute {
            topic: build_topic(config.as_ref(), leaf::DATA),
            action: RouteAction::Data,
        });
        debug!("Built {} command routes", routes.len());

        Self {
            config,
            radio,
            routes,
        }
    }

    pub fn routes(&self) -> &[CommandRoute] {
        &self.routes
    }

    pub fn build_topic(&self, leaf: &str) -> String {
        build_topic(self.config.as_ref(), leaf)
    }

    /// Subscribes the station's data and command topics plus the global
    /// satellite position topic. Failures are logged and skipped.
    pub fn subscribe_to_all(&self, transport: &mut dyn Transport) {
        let topics = [
            self.build_topic(leaf::DATA),
            self.build_topic(leaf::REMOTE_ALL),
            GLOBAL_SAT_POS.to_string(),
        ];
        for topic in topics {
            match transport.subscribe(&topic) {
                Ok(()) => debug!("Subscribed to {}", topic),
                Err(e) => warn!("Subscription to {} failed: {}", topic, e),
            }
        }
    }

    pub fn dispatch(
        &mut self,
        topic: &str,
        payload: &[u8],
        status: &mut StatusSnapshot,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        let matching: Vec<RouteAction> = self
            .routes
            .iter()
            .filter(|route| route.topic == topic)
            .map(|route| route.action)
            .collect();

        for action in matching {
            outcome.matched += 1;
            match action {
                RouteAction::SatellitePosition => update_sat_pos(payload, status),
                RouteAction::Data => debug!("Data channel message of {} bytes", payload.len()),
                RouteAction::Remote(RemoteCommand::Reset) => {
                    warn!("Remote reset requested on {}", topic);
                    outcome.restart = Some(RestartReason::RemoteReset);
                }
                RouteAction::Remote(command) => {
                    if let Err(e) = self.run_remote(command, payload) {
                        warn!("Radio rejected {:?}: {}", command, e);
                    }
                }
            }
        }

        if outcome.matched == 0 {
            trace!("No route for {}", topic);
        }
        outcome
    }

    fn run_remote(&mut self, command: RemoteCommand, payload: &[u8]) -> Result<(), RadioError> {
        info!("Remote {:?} ({} bytes)", command, payload.len());
        let radio = self.radio.as_mut();
        match command {
            RemoteCommand::Ping => radio.send_ping(),
            RemoteCommand::Frequency => radio.set_frequency(payload),
            RemoteCommand::Bandwidth => radio.set_bandwidth(payload),
            RemoteCommand::SpreadingFactor => radio.set_spreading_factor(payload),
            RemoteCommand::CodingRate => radio.set_coding_rate(payload),
            RemoteCommand::Crc => radio.set_crc(payload),
            RemoteCommand::PreambleLength => radio.set_preamble_length(payload),
            RemoteCommand::BeginLora => radio.begin_lora(payload),
            RemoteCommand::BeginFsk => radio.begin_fsk(payload),
            // handled by the dispatcher
            RemoteCommand::Reset => Ok(()),
        }
    }
}

/// Expects `[a, b]`. Oversized or malformed payloads leave the snapshot as is.
fn update_sat_pos(payload: &[u8], status: &mut StatusSnapshot) {
    if payload.len() > MAX_SAT_POS_LEN {
        warn!(
            "Satellite position payload of {} bytes exceeds {}",
            payload.len(),
            MAX_SAT_POS_LEN
        );
        return;
    }
    match serde_json::from_slice::<[f64; 2]>(payload) {
        Ok(pos) => {
            debug!("Satellite position {:?}", pos);
            status.sat_pos = pos;
        }
        Err(e) => warn!("Malformed satellite position: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRadio, MockTransport, StaticConfig};

    const NS: &str = "fossa/alice/gs1";

    fn router(radio: &MockRadio) -> TopicRouter {
        TopicRouter::new(
            Arc::new(StaticConfig::new("fossa", "alice", "gs1")),
            Box::new(radio.clone()),
        )
    }

    #[test]
    fn remote_commands_forward_raw_payload() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let mut status = StatusSnapshot::default();

        let cases = [
            ("freq", "freq"),
            ("bw", "bw"),
            ("sf", "sf"),
            ("cr", "cr"),
            ("crc", "crc"),
            ("bl", "bl"),
            ("fs", "fs"),
        ];
        for (leaf, _) in cases {
            let outcome = router.dispatch(&format!("{}/remote/{}", NS, leaf), b"\x01raw", &mut status);
            assert_eq!(outcome.matched, 1);
            assert_eq!(outcome.restart, None);
        }

        let calls = radio.calls();
        assert_eq!(calls.len(), cases.len());
        for ((action, payload), (_, expected)) in calls.iter().zip(cases) {
            assert_eq!(*action, expected);
            assert_eq!(payload.as_slice(), b"\x01raw");
        }
    }

    #[test]
    fn preamble_length_has_its_own_action() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        router.dispatch(&format!("{}/remote/pl", NS), b"8", &mut StatusSnapshot::default());
        assert_eq!(radio.calls(), vec![("pl", b"8".to_vec())]);
    }

    #[test]
    fn remote_ping_pings_the_radio() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        router.dispatch(&format!("{}/remote/ping", NS), b"", &mut StatusSnapshot::default());
        assert_eq!(radio.calls(), vec![("ping", Vec::new())]);
    }

    #[test]
    fn reset_requests_restart_without_radio_action() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let outcome = router.dispatch(
            &format!("{}/remote/reset", NS),
            b"1",
            &mut StatusSnapshot::default(),
        );
        assert_eq!(outcome.restart, Some(RestartReason::RemoteReset));
        assert!(radio.calls().is_empty());
    }

    #[test]
    fn unknown_topics_are_ignored() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let mut status = StatusSnapshot::default();
        for topic in [
            "fossa/alice/gs2/remote/freq",
            "fossa/alice/gs1/remote/unknown",
            "fossa/alice/gs1/remote/freq/extra",
        ] {
            assert_eq!(router.dispatch(topic, b"433.5", &mut status), DispatchOutcome::default());
        }
        assert!(radio.calls().is_empty());
    }

    #[test]
    fn radio_errors_do_not_stop_dispatch() {
        let radio = MockRadio::rejecting();
        let mut router = router(&radio);
        let outcome = router.dispatch(&format!("{}/remote/sf", NS), b"x", &mut StatusSnapshot::default());
        assert_eq!(outcome.matched, 1);
        assert_eq!(radio.calls().len(), 1);
    }

    #[test]
    fn satellite_position_updates_snapshot() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let mut status = StatusSnapshot::default();
        let outcome = router.dispatch(GLOBAL_SAT_POS, b"[12.5, -101.25]", &mut status);
        assert_eq!(outcome.matched, 1);
        assert_eq!(status.sat_pos, [12.5, -101.25]);
    }

    #[test]
    fn malformed_satellite_position_keeps_previous_value() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let mut status = StatusSnapshot::default();
        status.sat_pos = [1.0, 2.0];

        router.dispatch(GLOBAL_SAT_POS, b"[1, 2, 3]", &mut status);
        router.dispatch(GLOBAL_SAT_POS, b"{\"lat\": 3}", &mut status);
        router.dispatch(GLOBAL_SAT_POS, b"[1.0", &mut status);
        let long = format!("[{}, 1]", "1".repeat(MAX_SAT_POS_LEN));
        router.dispatch(GLOBAL_SAT_POS, long.as_bytes(), &mut status);

        assert_eq!(status.sat_pos, [1.0, 2.0]);
    }

    #[test]
    fn duplicate_routes_all_fire() {
        let radio = MockRadio::default();
        let mut router = router(&radio);
        let topic = format!("{}/remote/cr", NS);
        router.routes.push(CommandRoute {
            topic: topic.clone(),
            action: RouteAction::Remote(RemoteCommand::CodingRate),
        });
        let outcome = router.dispatch(&topic, b"5", &mut StatusSnapshot::default());
        assert_eq!(outcome.matched, 2);
        assert_eq!(radio.calls().len(), 2);
    }

    #[test]
    fn subscribes_data_commands_and_global_topic() {
        let radio = MockRadio::default();
        let router = router(&radio);
        let mut transport = MockTransport::accepting();
        transport.log().connected = true;
        router.subscribe_to_all(&mut transport);
        assert_eq!(
            transport.log().subscribed,
            vec![
                "fossa/alice/gs1/data".to_string(),
                "fossa/alice/gs1/remote/+".to_string(),
                GLOBAL_SAT_POS.to_string(),
            ]
        );
    }

    #[test]
    fn route_table_covers_every_command() {
        let radio = MockRadio::default();
        let router = router(&radio);
        for command in RemoteCommand::ALL {
            assert!(router
                .routes()
                .iter()
                .any(|r| r.action == RouteAction::Remote(command)));
        }
    }
}
