//! Remote-control surface of the radio driver
//!
//! The bridge never interprets command payloads. Bytes arriving on a
//! `remote/*` topic are handed over as-is and the controller decides what
//! they mean.

use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    #[error("Malformed command payload: {0}")]
    MalformedPayload(String),

    #[error("Radio rejected setting: {0}")]
    Rejected(String),
}

pub trait RadioController: Send {
    fn send_ping(&mut self) -> Result<(), RadioError>;
    fn set_frequency(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn set_bandwidth(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn set_spreading_factor(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn set_coding_rate(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn set_crc(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn set_preamble_length(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn begin_lora(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    fn begin_fsk(&mut self, payload: &[u8]) -> Result<(), RadioError>;
}

/// Controller for hosts without a radio attached. Accepts and logs every
/// textual command.
#[derive(Debug, Default)]
pub struct LoggingRadio;

impl LoggingRadio {
    fn log(&self, action: &str, payload: &[u8]) -> Result<(), RadioError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| RadioError::MalformedPayload(format!("{}: {}", action, e)))?;
        info!("Radio {} requested: {}", action, text);
        Ok(())
    }
}

impl RadioController for LoggingRadio {
    fn send_ping(&mut self) -> Result<(), RadioError> {
        self.log("ping", &[])
    }

    fn set_frequency(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("frequency", payload)
    }

    fn set_bandwidth(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("bandwidth", payload)
    }

    fn set_spreading_factor(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("spreading factor", payload)
    }

    fn set_coding_rate(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("coding rate", payload)
    }

    fn set_crc(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("crc", payload)
    }

    fn set_preamble_length(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("preamble length", payload)
    }

    fn begin_lora(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("LoRa begin", payload)
    }

    fn begin_fsk(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.log("FSK begin", payload)
    }
}
