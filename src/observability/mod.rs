//! Observability for the chat client
//!
//! Currently limited to structured logging; see [`logging`].

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
