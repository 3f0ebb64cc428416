//! Inbound message listener
//!
//! Drains the transport's inbound channel on its own task. Each message is
//! decoded as UTF-8, surfaced to the console, and checked against the
//! termination sentinel. Malformed payloads are logged and dropped; the
//! session stays subscribed.

use super::TERMINATION_SENTINEL;
use crate::console::Console;
use crate::transport::mqtt::InboundMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Malformed inbound payload
#[derive(Debug, Error)]
#[error("Invalid UTF-8 in message payload: {0}")]
pub struct DecodeError(#[from] std::str::Utf8Error);

/// Decode an inbound payload as UTF-8 text (pure function).
pub fn decode_payload(payload: &[u8]) -> Result<&str, DecodeError> {
    Ok(std::str::from_utf8(payload)?)
}

/// Listener for messages arriving on the inbound topic
pub struct InboundListener {
    console: Arc<dyn Console>,
    running: Arc<AtomicBool>,
}

impl InboundListener {
    pub fn new(console: Arc<dyn Console>, running: Arc<AtomicBool>) -> Self {
        Self { console, running }
    }

    /// Drain the inbound channel until it closes.
    ///
    /// The channel closes when the session's event loop stops, so this
    /// task ends on its own at disconnect.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = inbound.recv().await {
            self.handle_message(&message);
        }
        debug!("inbound channel closed; listener stopping");
    }

    /// Handle one inbound message: decode, display, evaluate the sentinel.
    pub fn handle_message(&self, message: &InboundMessage) {
        let text = match decode_payload(&message.payload) {
            Ok(text) => text,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, "dropping undecodable message");
                return;
            }
        };

        self.console.write_line(&format!(
            "Message received on topic {} : {}",
            message.topic, text
        ));

        if text == TERMINATION_SENTINEL {
            // swap so the exit notice is printed exactly once even if the
            // broker redelivers the sentinel (QoS 1 permits duplicates)
            let was_running = self.running.swap(false, Ordering::SeqCst);
            if was_running {
                info!("termination sentinel received");
                self.console
                    .write_line("They say you BYE | Press ENTER to end the chat");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingConsole {
        lines: Mutex<Vec<String>>,
    }

    impl Console for CapturingConsole {
        fn read_line(&self, _prompt: &str) -> std::io::Result<Option<String>> {
            Ok(None)
        }

        fn write_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn listener_with_console() -> (InboundListener, Arc<CapturingConsole>, Arc<AtomicBool>) {
        let console = Arc::new(CapturingConsole::default());
        let running = Arc::new(AtomicBool::new(true));
        let listener = InboundListener::new(console.clone(), running.clone());
        (listener, console, running)
    }

    fn message(topic: &str, payload: &[u8]) -> InboundMessage {
        InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_decode_payload_valid_utf8() {
        assert_eq!(decode_payload(b"hello").unwrap(), "hello");
        assert_eq!(decode_payload("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn test_decode_payload_invalid_utf8() {
        assert!(decode_payload(&[0xff, 0xfe, 0xfd]).is_err());
    }

    #[test]
    fn test_regular_message_is_displayed_and_keeps_running() {
        let (listener, console, running) = listener_with_console();

        listener.handle_message(&message("lab/messaging/car1", b"hello"));

        assert!(running.load(Ordering::SeqCst));
        let lines = console.lines.lock().unwrap();
        assert_eq!(
            lines.as_slice(),
            ["Message received on topic lab/messaging/car1 : hello"]
        );
    }

    #[test]
    fn test_sentinel_stops_running_and_prints_notice() {
        let (listener, console, running) = listener_with_console();

        listener.handle_message(&message("lab/messaging/car1", b"bye"));

        assert!(!running.load(Ordering::SeqCst));
        let lines = console.lines.lock().unwrap();
        assert_eq!(lines[0], "Message received on topic lab/messaging/car1 : bye");
        assert_eq!(lines[1], "They say you BYE | Press ENTER to end the chat");
    }

    #[test]
    fn test_duplicate_sentinel_prints_notice_once() {
        let (listener, console, running) = listener_with_console();

        listener.handle_message(&message("lab/messaging/car1", b"bye"));
        listener.handle_message(&message("lab/messaging/car1", b"bye"));

        assert!(!running.load(Ordering::SeqCst));
        let lines = console.lines.lock().unwrap();
        let notices = lines
            .iter()
            .filter(|l| l.contains("Press ENTER"))
            .count();
        assert_eq!(notices, 1);
    }

    #[test]
    fn test_sentinel_must_match_exactly() {
        let (listener, _console, running) = listener_with_console();

        listener.handle_message(&message("lab/messaging/car1", b"BYE"));
        listener.handle_message(&message("lab/messaging/car1", b"bye "));
        listener.handle_message(&message("lab/messaging/car1", b"goodbye"));

        assert!(running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_malformed_payload_is_dropped_without_panic() {
        let (listener, console, running) = listener_with_console();

        listener.handle_message(&message("lab/messaging/car1", &[0xff, 0xfe]));
        // Session keeps working afterwards
        listener.handle_message(&message("lab/messaging/car1", b"still here"));

        assert!(running.load(Ordering::SeqCst));
        let lines = console.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("still here"));
    }

    #[tokio::test]
    async fn test_run_drains_channel_until_closed() {
        let (listener, console, running) = listener_with_console();
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(listener.run(rx));

        tx.send(message("lab/messaging/car1", b"one")).await.unwrap();
        tx.send(message("lab/messaging/car1", b"bye")).await.unwrap();
        drop(tx);

        handle.await.unwrap();

        assert!(!running.load(Ordering::SeqCst));
        assert_eq!(console.lines.lock().unwrap().len(), 3);
    }
}
