//! Station configuration
//!
//! The bridge reads everything it needs to know about the station through the
//! [`ConfigProvider`] trait. [`StationConfig`] is the file-backed implementation
//! used by the binary; tests substitute their own provider.
//!
//! ```text
//! [broker]   server, port, user, pass, client_id
//! [station]  thing_name, latitude, longitude, board, topic_root
//! [timing]   reconnect / ping / sysinfo / tick intervals, attempt ceiling
//! ```

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "GROUNDLINK_CONFIG";
const CONFIG_DIR: &str = "groundlink";
const CONFIG_FILE: &str = "config.toml";

/// Read-only view of station identity, location and broker credentials.
///
/// Every getter is read on demand, so topic names and payloads always reflect
/// the provider's current values.
pub trait ConfigProvider: Send + Sync {
    fn topic_root(&self) -> &str;
    fn mqtt_server(&self) -> &str;
    fn mqtt_port(&self) -> u16;
    fn mqtt_user(&self) -> &str;
    fn mqtt_pass(&self) -> &str;
    fn client_id(&self) -> String;
    fn thing_name(&self) -> &str;
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
    fn board(&self) -> u8;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// Falls back to `groundlink-{thing_name}` when unset
    pub client_id: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 1883,
            user: String::new(),
            pass: String::new(),
            client_id: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StationIdentity {
    pub thing_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub board: u8,
    pub topic_root: String,
}

impl Default for StationIdentity {
    fn default() -> Self {
        Self {
            thing_name: "groundstation".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            board: 0,
            topic_root: "fossa".to_string(),
        }
    }
}

/// Connection lifecycle and loop cadence
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum spacing between two reconnect attempts
    pub reconnection_interval_ms: u64,
    /// Failed attempts tolerated before the process must restart
    pub connection_timeout: u32,
    pub ping_interval_ms: u64,
    /// 0 disables periodic system info
    pub sysinfo_interval_ms: u64,
    pub tick_interval_ms: u64,
    /// Upper bound for waiting on the broker's ConnAck
    pub connect_timeout_ms: u64,
    /// Upper bound for one receive pass of the transport
    pub poll_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnection_interval_ms: 5_000,
            connection_timeout: 20,
            ping_interval_ms: 60_000,
            sysinfo_interval_ms: 0,
            tick_interval_ms: 50,
            connect_timeout_ms: 3_000,
            poll_timeout_ms: 10,
        }
    }
}

impl TimingConfig {
    pub fn reconnection_interval(&self) -> Duration {
        Duration::from_millis(self.reconnection_interval_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn sysinfo_interval(&self) -> Option<Duration> {
        (self.sysinfo_interval_ms > 0).then(|| Duration::from_millis(self.sysinfo_interval_ms))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StationConfig {
    pub broker: BrokerConfig,
    pub station: StationIdentity,
    pub timing: TimingConfig,
}

impl StationConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: StationConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Topic segments must not contain separators or wildcards
    pub fn validate(&self) -> Result<(), ConfigError> {
        let segments = [
            ("topic_root", self.station.topic_root.as_str()),
            ("user", self.broker.user.as_str()),
            ("thing_name", self.station.thing_name.as_str()),
        ];
        for (name, value) in segments {
            if value.contains(['/', '+', '#']) {
                return Err(ConfigError::Invalid(format!(
                    "{} '{}' must not contain '/', '+' or '#'",
                    name, value
                )));
            }
        }
        if self.station.thing_name.is_empty() {
            return Err(ConfigError::Invalid("thing_name is empty".to_string()));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the configuration file, writing a default one if none exists yet.
    pub async fn load_or_default() -> Result<Self> {
        let path = config_path()?;

        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check for config file {:?}: {}", path, e))?
        {
            warn!("No configuration at {:?}, writing defaults", path);
            let config = StationConfig::default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
            }
            tokio::fs::write(&path, config.to_toml()?)
                .await
                .map_err(|e| eyre!("Failed to write default config: {}", e))?;
            return Ok(config);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config {:?}: {}", path, e))?;
        let config = StationConfig::from_toml(&raw)?;
        info!(
            "Loaded configuration for station '{}' from {:?}",
            config.station.thing_name, path
        );
        debug!("Timing settings: {:?}", config.timing);
        Ok(config)
    }
}

fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory available"))?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    Ok(path)
}

impl ConfigProvider for StationConfig {
    fn topic_root(&self) -> &str {
        &self.station.topic_root
    }

    fn mqtt_server(&self) -> &str {
        &self.broker.server
    }

    fn mqtt_port(&self) -> u16 {
        self.broker.port
    }

    fn mqtt_user(&self) -> &str {
        &self.broker.user
    }

    fn mqtt_pass(&self) -> &str {
        &self.broker.pass
    }

    fn client_id(&self) -> String {
        self.broker
            .client_id
            .clone()
            .unwrap_or_else(|| format!("groundlink-{}", self.station.thing_name))
    }

    fn thing_name(&self) -> &str {
        &self.station.thing_name
    }

    fn latitude(&self) -> f64 {
        self.station.latitude
    }

    fn longitude(&self) -> f64 {
        self.station.longitude
    }

    fn board(&self) -> u8 {
        self.station.board
    }
}
