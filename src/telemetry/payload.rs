//! Wire documents published by the station.

use serde::Serialize;

use crate::status::SystemInfo;

#[derive(Debug, Serialize)]
pub struct Welcome<'a> {
    pub station: &'a str,
    pub station_location: [f64; 2],
    pub version: &'a str,
    pub board: u8,
}

/// Fields shared by every live-telemetry document
#[derive(Debug, Serialize)]
pub struct Reception<'a> {
    pub station: &'a str,
    pub station_location: [f64; 2],
    pub rssi: f32,
    pub snr: f32,
    pub frequency_error: f32,
    #[serde(rename = "unix_GS_time")]
    pub unix_gs_time: i64,
}

#[derive(Debug, Serialize)]
pub struct SysInfoReport<'a> {
    #[serde(flatten)]
    pub reception: Reception<'a>,
    #[serde(flatten)]
    pub sys_info: &'a SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct Pong<'a> {
    #[serde(flatten)]
    pub reception: Reception<'a>,
    pub pong: u8,
}

#[derive(Debug, Serialize)]
pub struct TextMessage<'a> {
    #[serde(flatten)]
    pub reception: Reception<'a>,
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct MiniTtnMessage<'a> {
    #[serde(flatten)]
    pub reception: Reception<'a>,
    #[serde(rename = "msgTTN")]
    pub msg_ttn: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RawPacket<'a> {
    #[serde(flatten)]
    pub reception: Reception<'a>,
    pub data: &'a str,
}
