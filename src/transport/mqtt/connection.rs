//! Pure connection state management for the MQTT session
//!
//! This module contains pure functions for connection state handling,
//! option configuration, and event routing. Nothing here performs I/O,
//! which keeps the decision logic independently testable.

use crate::config::{ChatConfig, Credentials};
use rumqttc::{Event, MqttOptions, Packet, SubscribeReasonCode, TlsConfiguration, Transport};
use std::time::Duration;
use thiserror::Error;

/// Connection state for the MQTT session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state - attempting to connect
    Connecting,
    /// Successfully connected and ready for operations
    Connected,
    /// Disconnected with reason
    Disconnected(String),
}

impl SessionState {
    /// Whether publish and subscribe calls are allowed in this state
    pub fn can_operate(&self) -> bool {
        matches!(self, SessionState::Connected)
    }
}

/// Bounded connect-retry configuration.
///
/// The original client made a single connect attempt; bounded retry with a
/// short backoff pattern is an addition. Steady-state reconnection is
/// deliberately absent: once connected, a lost connection ends the session.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of connect attempts
    pub max_attempts: u32,
    /// Backoff pattern in milliseconds, indexed by attempt
    pub backoff_pattern: Vec<u64>,
    /// Delay to use after the pattern is exhausted
    pub sustained_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_pattern: vec![250, 500, 1000],
            sustained_delay: 1000,
        }
    }
}

impl RetryConfig {
    /// A single attempt, matching the original client's behavior.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_pattern: Vec::new(),
            sustained_delay: 0,
        }
    }

    /// Calculate backoff delay in milliseconds for a given attempt (1-based).
    pub fn calculate_backoff_delay(&self, attempt: u32) -> u64 {
        let index = (attempt.saturating_sub(1)) as usize;
        self.backoff_pattern
            .get(index)
            .copied()
            .unwrap_or(self.sustained_delay)
    }
}

/// MQTT session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Subscription failed")]
    SubscriptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Not connected - current state: {state:?}")]
    NotConnected { state: SessionState },
}

/// A message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on
    pub topic: String,
    /// Raw payload bytes; interpretation as UTF-8 happens in the listener
    pub payload: Vec<u8>,
}

/// Keep-alive interval for the broker connection
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Pure function to configure MQTT options from config and credentials.
///
/// The client ID is the device identity; the connection is always mutual
/// TLS with the loaded certificate material (MQTT 3.1.1 over port 8883 in
/// the default configuration).
pub fn configure_mqtt_options(
    device_id: &str,
    config: &ChatConfig,
    credentials: &Credentials,
) -> MqttOptions {
    let mut options = MqttOptions::new(device_id, &config.endpoint_address, config.port);
    options.set_keep_alive(KEEP_ALIVE);

    let tls = TlsConfiguration::Simple {
        ca: credentials.root_ca.clone(),
        alpn: None,
        client_auth: Some((
            credentials.certificate.clone(),
            credentials.private_key.clone(),
        )),
    };
    options.set_transport(Transport::Tls(tls));

    options
}

/// Routing decisions for MQTT events
#[derive(Debug, Clone)]
pub enum EventRoute {
    /// Connection acknowledged - ready to publish/subscribe
    ConnectionAcknowledged,
    /// Message received on a subscribed topic
    MessageReceived {
        topic: String,
        payload: Vec<u8>,
        retain: bool,
    },
    /// Broker closed the connection
    Disconnected,
    /// Subscription confirmed by the broker
    SubscriptionConfirmed {
        packet_id: u16,
        failed: bool,
    },
    /// Infrastructure event (PingResp, PubAck, etc.)
    InfrastructureEvent(String),
    /// Outgoing event (handled automatically by rumqttc)
    OutgoingEvent,
}

/// Route an MQTT event to the appropriate handler (pure routing decision).
pub fn route_mqtt_event(event: &Event) -> EventRoute {
    match event {
        Event::Incoming(incoming) => match incoming {
            Packet::ConnAck(_) => EventRoute::ConnectionAcknowledged,
            Packet::Publish(publish) => EventRoute::MessageReceived {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
                retain: publish.retain,
            },
            Packet::Disconnect => EventRoute::Disconnected,
            Packet::SubAck(suback) => EventRoute::SubscriptionConfirmed {
                packet_id: suback.pkid,
                failed: suback
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure)),
            },
            other => EventRoute::InfrastructureEvent(format!("{other:?}")),
        },
        Event::Outgoing(_) => EventRoute::OutgoingEvent,
    }
}
