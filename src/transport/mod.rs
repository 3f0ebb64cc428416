//! Transport layer for chat messaging
//!
//! This module provides the transport abstraction and its MQTT
//! implementation. The trait exists so the session loop can be tested
//! against an in-memory transport.

pub mod mqtt;

/// Transport trait for chat messaging
///
/// Abstraction over the broker connection to enable dependency injection
/// and testing. Implementations must be safe for concurrent publish and
/// subscribe calls on one connection.
#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Subscribe to a topic at QoS 1
    async fn subscribe(&self, topic: &str) -> Result<(), Self::Error>;

    /// Publish a UTF-8 payload to a topic at QoS 1
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error>;

    /// Disconnect from the broker
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Check if the transport is currently connected
    fn is_connected(&self) -> bool;
}

/// Type alias for the MQTT transport
pub type MqttTransport = mqtt::MqttSession;
