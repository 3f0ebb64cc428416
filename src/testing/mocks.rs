//! Mock implementations for testing
//!
//! In-memory [`MessageTransport`] and [`Console`] implementations used by
//! unit and integration tests.

use crate::console::Console;
use crate::transport::mqtt::SessionError;
use crate::transport::MessageTransport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type PublishedMessage = (String, Vec<u8>);

/// Transport that records published messages and accepts all subscriptions
#[derive(Debug, Default)]
pub struct RecordingTransport {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    subscribed: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().await.clone()
    }

    pub async fn subscribed(&self) -> Vec<String> {
        self.subscribed.lock().await.clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    type Error = SessionError;

    async fn subscribe(&self, topic: &str) -> Result<(), Self::Error> {
        self.subscribed.lock().await.push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error> {
        self.published
            .lock()
            .await
            .push((topic.to_string(), payload));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Transport whose publish and subscribe calls always fail
#[derive(Debug, Default)]
pub struct FailingTransport;

#[async_trait]
impl MessageTransport for FailingTransport {
    type Error = SessionError;

    async fn subscribe(&self, _topic: &str) -> Result<(), Self::Error> {
        Err(SessionError::SubscriptionFailed(
            "mock subscription failure".to_string().into(),
        ))
    }

    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), Self::Error> {
        Err(SessionError::PublishFailed(
            "mock publish failure".to_string().into(),
        ))
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Console fed from a fixed script of input lines.
///
/// Reads pop lines in order and return `None` (end of input) once the
/// script is exhausted. Output lines are captured for assertions. An
/// optional flag can be cleared as each read completes, simulating the
/// sentinel arriving while the loop is blocked on input.
pub struct ScriptedConsole {
    lines: std::sync::Mutex<VecDeque<String>>,
    output: std::sync::Mutex<Vec<String>>,
    reads: AtomicUsize,
    clear_on_read: Option<Arc<AtomicBool>>,
}

impl ScriptedConsole {
    pub fn with_lines<S: Into<String>, I: IntoIterator<Item = S>>(lines: I) -> Self {
        Self {
            lines: std::sync::Mutex::new(lines.into_iter().map(Into::into).collect()),
            output: std::sync::Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            clear_on_read: None,
        }
    }

    /// Clear `flag` whenever a read completes.
    pub fn clearing_flag_on_read(mut self, flag: Arc<AtomicBool>) -> Self {
        self.clear_on_read = Some(flag);
        self
    }

    /// Number of read_line calls made so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Output lines written so far.
    pub fn output(&self) -> Vec<String> {
        self.output.lock().unwrap().clone()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&self, _prompt: &str) -> std::io::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let line = self.lines.lock().unwrap().pop_front();
        if let Some(flag) = &self.clear_on_read {
            flag.store(false, Ordering::SeqCst);
        }
        Ok(line)
    }

    fn write_line(&self, line: &str) {
        self.output.lock().unwrap().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_transport_records() {
        let transport = RecordingTransport::new();
        transport.subscribe("lab/messaging/car1").await.unwrap();
        transport
            .publish("lab/messaging/car2", b"hi".to_vec())
            .await
            .unwrap();

        assert_eq!(transport.subscribed().await, vec!["lab/messaging/car1"]);
        assert_eq!(
            transport.published().await,
            vec![("lab/messaging/car2".to_string(), b"hi".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_failing_transport_fails() {
        let transport = FailingTransport;
        assert!(transport.subscribe("t").await.is_err());
        assert!(transport.publish("t", vec![]).await.is_err());
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_scripted_console_pops_lines_then_eof() {
        let console = ScriptedConsole::with_lines(["a", "b"]);
        assert_eq!(console.read_line("p").unwrap(), Some("a".to_string()));
        assert_eq!(console.read_line("p").unwrap(), Some("b".to_string()));
        assert_eq!(console.read_line("p").unwrap(), None);
        assert_eq!(console.reads(), 3);
    }

    #[test]
    fn test_scripted_console_clears_flag_on_read() {
        let flag = Arc::new(AtomicBool::new(true));
        let console = ScriptedConsole::with_lines(["a"]).clearing_flag_on_read(flag.clone());

        console.read_line("p").unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }
}
