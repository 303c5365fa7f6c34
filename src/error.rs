use thiserror::Error;

use crate::mqtt::router::RestartReason;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The process has to be restarted by its supervisor
    #[error("Restart required: {0:?}")]
    RestartRequired(RestartReason),

    #[error("Bridge halted after a restart was signalled")]
    Halted,

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}
