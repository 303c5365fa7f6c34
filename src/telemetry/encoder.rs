use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::frame::{parse_frame, Frame};
use super::payload::{MiniTtnMessage, Pong, RawPacket, Reception, SysInfoReport, TextMessage, Welcome};
use super::{TelemetryError, LARGE_DOC_LIMIT, SMALL_DOC_LIMIT};
use crate::config::ConfigProvider;
use crate::mqtt::topics::{build_topic, leaf};
use crate::mqtt::transport::Transport;
use crate::status::StatusSnapshot;

/// A serialized document and the leaf it belongs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub leaf: &'static str,
    pub body: Vec<u8>,
}

pub struct TelemetryEncoder {
    config: Arc<dyn ConfigProvider>,
}

impl TelemetryEncoder {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self { config }
    }

    fn location(&self) -> [f64; 2] {
        [self.config.latitude(), self.config.longitude()]
    }

    fn reception(&self, status: &StatusSnapshot) -> Reception<'_> {
        Reception {
            station: self.config.thing_name(),
            station_location: self.location(),
            rssi: status.last_packet.rssi,
            snr: status.last_packet.snr,
            frequency_error: status.last_packet.frequency_error,
            unix_gs_time: chrono::Utc::now().timestamp(),
        }
    }

    pub fn encode_welcome(&self, status: &StatusSnapshot) -> Result<Outbound, TelemetryError> {
        let doc = Welcome {
            station: self.config.thing_name(),
            station_location: self.location(),
            version: &status.version,
            board: self.config.board(),
        };
        serialize(leaf::WELCOME, &doc, LARGE_DOC_LIMIT)
    }

    pub fn encode_system_info(&self, status: &StatusSnapshot) -> Result<Outbound, TelemetryError> {
        let doc = SysInfoReport {
            reception: self.reception(status),
            sys_info: &status.sys_info,
        };
        serialize(leaf::SYS_INFO, &doc, LARGE_DOC_LIMIT)
    }

    pub fn encode_pong(&self, status: &StatusSnapshot) -> Result<Outbound, TelemetryError> {
        let doc = Pong {
            reception: self.reception(status),
            pong: 1,
        };
        serialize(leaf::PONG, &doc, SMALL_DOC_LIMIT)
    }

    /// Relayed radio frame. Marker-prefixed frames go to `miniTTN` as a hex
    /// byte array, everything else to `msg` as text.
    pub fn encode_message(
        &self,
        status: &StatusSnapshot,
        frame: &[u8],
    ) -> Result<Outbound, TelemetryError> {
        let parsed = parse_frame(frame)?;
        let reception = self.reception(status);
        match parsed {
            Frame::MiniTtn(_) => {
                debug!("miniTTN frame of {} bytes", frame.len());
                let doc = MiniTtnMessage {
                    reception,
                    msg_ttn: parsed.hex_bytes(),
                };
                serialize(leaf::MINI_TTN, &doc, SMALL_DOC_LIMIT)
            }
            Frame::Text(_) => {
                let doc = TextMessage {
                    reception,
                    msg: parsed.text(),
                };
                serialize(leaf::MSG, &doc, SMALL_DOC_LIMIT)
            }
        }
    }

    pub fn encode_raw_packet(
        &self,
        status: &StatusSnapshot,
        packet: &str,
    ) -> Result<Outbound, TelemetryError> {
        let doc = RawPacket {
            reception: self.reception(status),
            data: packet,
        };
        serialize(leaf::RAW_PACKET, &doc, SMALL_DOC_LIMIT)
    }

    /// Publishes once on the document's leaf topic.
    pub fn publish(
        &self,
        transport: &mut dyn Transport,
        outbound: &Outbound,
    ) -> Result<(), TelemetryError> {
        let topic = build_topic(self.config.as_ref(), outbound.leaf);
        transport.publish(&topic, &outbound.body)?;
        debug!("Published {} bytes to {}", outbound.body.len(), topic);
        Ok(())
    }
}

fn serialize<T: Serialize>(
    leaf: &'static str,
    doc: &T,
    limit: usize,
) -> Result<Outbound, TelemetryError> {
    let mut body = Vec::with_capacity(limit);
    serde_json::to_writer(&mut body, doc)?;
    if body.len() > limit {
        return Err(TelemetryError::Oversize {
            leaf,
            len: body.len(),
            limit,
        });
    }
    Ok(Outbound { leaf, body })
}
