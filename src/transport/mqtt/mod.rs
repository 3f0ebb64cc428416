//! MQTT transport implementation
//!
//! Split into pure decision logic ([`connection`]) and impure I/O
//! ([`session`]). The session owns a single rumqttc client plus a
//! background event-loop task; received publishes are forwarded over a
//! channel rather than invoked as callbacks, which keeps application logic
//! off the transport's delivery context.

pub mod connection;
pub mod session;

pub use connection::{
    configure_mqtt_options, InboundMessage, RetryConfig, SessionError, SessionState,
};
pub use session::MqttSession;
