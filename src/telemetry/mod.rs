//! # Telemetry
//!
//! Outbound documents of the station. Each encode builds a typed document,
//! serializes it into a buffer sized to the leaf's ceiling and publishes it
//! once. Nothing is retried or buffered: a failed publish loses that cycle's
//! telemetry.
//!
//! ```text
//! StatusSnapshot ──► TelemetryEncoder ──► Outbound { leaf, body } ──► Transport
//! ```

pub mod encoder;
pub mod frame;
pub mod payload;

use crate::mqtt::transport::TransportError;

/// Serialized size ceiling of welcome and sysinfo documents
pub const LARGE_DOC_LIMIT: usize = 512;
/// Serialized size ceiling of pong, msg, miniTTN and rawpacket documents
pub const SMALL_DOC_LIMIT: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{leaf} document is {len} bytes, limit is {limit}")]
    Oversize {
        leaf: &'static str,
        len: usize,
        limit: usize,
    },

    #[error("Frame of {len} bytes is shorter than its trailer")]
    MalformedFrame { len: usize },

    #[error("Publish failed: {0}")]
    Publish(#[from] TransportError),
}

pub use encoder::{Outbound, TelemetryEncoder};
