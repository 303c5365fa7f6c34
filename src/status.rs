//! Live station telemetry read by the encoder at publish time.

use serde::{Deserialize, Serialize};

/// Reception quality of the last packet heard by the radio
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketInfo {
    pub rssi: f32,
    pub snr: f32,
    pub frequency_error: f32,
}

/// Health report of the tracked satellite, serialized with the control
/// plane's camelCase field names
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub battery_charging_voltage: f32,
    pub battery_charging_current: f32,
    pub battery_voltage: f32,
    pub solar_cell_a_voltage: f32,
    pub solar_cell_b_voltage: f32,
    pub solar_cell_c_voltage: f32,
    pub battery_temperature: f32,
    pub board_temperature: f32,
    pub mcu_temperature: i32,
    pub reset_counter: u16,
    pub power_config: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub version: String,
    pub last_packet: PacketInfo,
    pub sys_info: SystemInfo,
    /// Position shared by the control plane on the global topic
    pub sat_pos: [f64; 2],
}

impl StatusSnapshot {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }
}
