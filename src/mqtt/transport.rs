//! Narrow publish/subscribe interface the bridge is written against.

use super::config::ConnectOptions;
use super::message_manager::InboundMessage;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Not connected to broker")]
    NotConnected,

    #[error("Broker refused connection: {0}")]
    Refused(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out waiting for broker")]
    Timeout,

    #[error("Client request failed: {0}")]
    Client(String),
}

/// Session with a broker.
///
/// None of these calls may block for longer than the bounds carried in
/// [`ConnectOptions`]; the bridge runs on a single cooperative loop.
pub trait Transport: Send {
    /// Replaces any previous session with a new one.
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Runs protocol maintenance and drains publishes received since the
    /// last call.
    fn poll(&mut self) -> Vec<InboundMessage>;
}
