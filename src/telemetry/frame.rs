//! Framing of packets relayed from the radio into `msg`/`miniTTN` documents.

use super::TelemetryError;

/// Bytes at the end of every relayed frame that are not part of the body
pub const TRAILER_LEN: usize = 12;

/// Prefix of frames following the miniTTN protocol
pub const MINI_TTN_MARKER: &[u8; 3] = b"T0@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Body of a marker-prefixed frame, marker included
    MiniTtn(&'a [u8]),
    Text(&'a [u8]),
}

pub fn parse_frame(frame: &[u8]) -> Result<Frame<'_>, TelemetryError> {
    let body_len = frame
        .len()
        .checked_sub(TRAILER_LEN)
        .ok_or(TelemetryError::MalformedFrame { len: frame.len() })?;
    let body = &frame[..body_len];

    if frame.starts_with(MINI_TTN_MARKER) {
        Ok(Frame::MiniTtn(body))
    } else {
        Ok(Frame::Text(body))
    }
}

impl Frame<'_> {
    /// Text up to the first NUL byte, lossily decoded
    pub fn text(&self) -> String {
        let body = match self {
            Frame::MiniTtn(body) | Frame::Text(body) => body,
        };
        let end = body.iter().position(|b| *b == 0).unwrap_or(body.len());
        String::from_utf8_lossy(&body[..end]).into_owned()
    }

    pub fn hex_bytes(&self) -> Vec<String> {
        let body = match self {
            Frame::MiniTtn(body) | Frame::Text(body) => body,
        };
        body.iter().map(|b| hex::encode([*b])).collect()
    }
}
