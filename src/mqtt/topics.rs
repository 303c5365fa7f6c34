//! Topic names in the station namespace `{root}/{user}/{thing_name}/{leaf}`.

use crate::config::ConfigProvider;

/// Cross-station topic carrying the tracked satellite's position
pub const GLOBAL_SAT_POS: &str = "fossa/global/sat_pos_oled";

pub mod leaf {
    pub const STATUS: &str = "status";
    pub const PING: &str = "ping";
    pub const WELCOME: &str = "welcome";
    pub const SYS_INFO: &str = "sysinfo";
    pub const PONG: &str = "pong";
    pub const MSG: &str = "msg";
    pub const MINI_TTN: &str = "miniTTN";
    pub const RAW_PACKET: &str = "rawpacket";
    pub const DATA: &str = "data";
    pub const REMOTE: &str = "remote/";
    pub const REMOTE_ALL: &str = "remote/+";
}

/// Inbound command leaves under `remote/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    Reset,
    Ping,
    Frequency,
    Bandwidth,
    SpreadingFactor,
    CodingRate,
    Crc,
    PreambleLength,
    BeginLora,
    BeginFsk,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 10] = [
        RemoteCommand::Reset,
        RemoteCommand::Ping,
        RemoteCommand::Frequency,
        RemoteCommand::Bandwidth,
        RemoteCommand::SpreadingFactor,
        RemoteCommand::CodingRate,
        RemoteCommand::Crc,
        RemoteCommand::PreambleLength,
        RemoteCommand::BeginLora,
        RemoteCommand::BeginFsk,
    ];

    pub fn leaf(self) -> &'static str {
        match self {
            RemoteCommand::Reset => "reset",
            RemoteCommand::Ping => "ping",
            RemoteCommand::Frequency => "freq",
            RemoteCommand::Bandwidth => "bw",
            RemoteCommand::SpreadingFactor => "sf",
            RemoteCommand::CodingRate => "cr",
            RemoteCommand::Crc => "crc",
            RemoteCommand::PreambleLength => "pl",
            RemoteCommand::BeginLora => "bl",
            RemoteCommand::BeginFsk => "fs",
        }
    }
}

/// `{root}/{user}/{thing_name}/{leaf}` from the provider's current values.
pub fn build_topic(config: &dyn ConfigProvider, leaf: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        config.topic_root(),
        config.mqtt_user(),
        config.thing_name(),
        leaf
    )
}

pub fn remote_topic(config: &dyn ConfigProvider, command: RemoteCommand) -> String {
    build_topic(config, &format!("{}{}", leaf::REMOTE, command.leaf()))
}
