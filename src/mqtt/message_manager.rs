use chrono::{DateTime, Utc};
use std::fmt;

const PREVIEW_LEN: usize = 32;

/// A publish received from the broker, waiting to be routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let end = self.payload.len().min(PREVIEW_LEN);
        let preview = String::from_utf8_lossy(&self.payload[..end]);
        write!(
            f,
            "{} - {} : {} ({} bytes)",
            self.received_at.format("%H:%M:%S%.3f"),
            self.topic,
            preview,
            self.payload.len()
        )
    }
}
