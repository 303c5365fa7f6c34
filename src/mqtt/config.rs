use crate::config::ConfigProvider;
use std::time::Duration;

/// QoS level of the last will, as required by the control plane
pub const WILL_QOS: u8 = 2;

/// Payload announcing the station went offline
pub const WILL_PAYLOAD: &str = "0";

#[derive(Debug, Clone, PartialEq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

/// Everything a transport needs for one connect attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub client_id: String,
    pub server: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub will: LastWill,
    /// Bound on how long a single attempt may block the loop
    pub connect_timeout: Duration,
}

impl ConnectOptions {
    /// Builds the options from the provider's current values.
    pub fn from_provider(
        config: &dyn ConfigProvider,
        status_topic: String,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            client_id: config.client_id(),
            server: config.mqtt_server().to_string(),
            port: config.mqtt_port(),
            user: config.mqtt_user().to_string(),
            pass: config.mqtt_pass().to_string(),
            will: LastWill {
                topic: status_topic,
                payload: WILL_PAYLOAD.to_string(),
                qos: WILL_QOS,
                retain: true,
            },
            connect_timeout,
        }
    }
}
