//! # MQTT Integration Module
//!
//! Connects the ground station to the control plane broker and turns inbound
//! publishes into radio actions.
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Connect options and the status last will
//! ├── connection.rs       - Reconnect / attempt ceiling / keepalive state machine
//! ├── message_manager.rs  - Inbound message representation
//! ├── mqtt_handler.rs     - rumqttc-backed transport
//! ├── router.rs           - Route table and dispatch of inbound topics
//! ├── topics.rs           - Station namespace and leaf names
//! └── transport.rs        - Transport trait the rest of the crate is written against
//! ```
//!
//! Everything runs on one cooperative loop. The transport is owned by the
//! bridge and lent to the connection manager, router and encoder per call, so
//! no locking is involved.

pub mod config;
pub mod connection;
pub mod message_manager;
pub mod mqtt_handler;
pub mod router;
pub mod topics;
pub mod transport;
