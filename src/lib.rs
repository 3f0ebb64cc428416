//! iotchat - Two-party MQTT chat client
//!
//! A terminal chat client for exactly two devices exchanging plaintext
//! lines over a shared MQTT broker, authenticating with per-device
//! certificates (mutual TLS).
//!
//! # Overview
//!
//! This crate provides:
//! - Topic derivation from the two known device identities
//! - An MQTT 3.1.1 session with mutual-TLS authentication and QoS 1
//!   subscribe/publish
//! - An inbound listener that surfaces messages to the console and
//!   terminates the session on the `"bye"` sentinel
//! - A foreground loop publishing console input to the peer's topic
//!
//! # Quick Start
//!
//! ```rust
//! use iotchat::identity::TopicPair;
//!
//! let topics = TopicPair::for_device("car1");
//! assert_eq!(topics.inbound, "lab/messaging/car1");
//! assert_eq!(topics.outbound, "lab/messaging/car2");
//! ```

pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod observability;
pub mod testing;
pub mod transport;

pub use chat::{InboundListener, SessionLoop, TERMINATION_SENTINEL};
pub use config::{ChatConfig, ConfigError, Credentials};
pub use console::{Console, StdConsole};
pub use error::{ChatError, ChatResult};
pub use identity::TopicPair;
pub use transport::mqtt::{MqttSession, SessionError};
pub use transport::MessageTransport;
