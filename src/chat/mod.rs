//! Chat session logic
//!
//! Two concurrent activities share one broker session: the inbound
//! listener task draining received messages, and the foreground session
//! loop reading console lines and publishing them. They coordinate through
//! a single shared atomic running flag; receipt of the termination
//! sentinel is the only transition out of the running state.

pub mod listener;
pub mod session_loop;

pub use listener::{decode_payload, DecodeError, InboundListener};
pub use session_loop::SessionLoop;

/// Message text that ends the chat session when received
pub const TERMINATION_SENTINEL: &str = "bye";
