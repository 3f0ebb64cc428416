//! Foreground session loop
//!
//! Reads console lines and publishes them to the outbound topic until the
//! shared running flag goes false. The console read blocks, so the flag is
//! only observed between input cycles: a line typed after the sentinel
//! arrives is still published before the loop exits, matching the original
//! client's behavior.

use crate::console::Console;
use crate::error::{ChatError, ChatResult};
use crate::transport::MessageTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Foreground loop publishing console input to the outbound topic
pub struct SessionLoop<'a, T: MessageTransport> {
    transport: &'a T,
    console: Arc<dyn Console>,
    running: Arc<AtomicBool>,
    outbound_topic: String,
}

impl<'a, T: MessageTransport> SessionLoop<'a, T> {
    pub fn new(
        transport: &'a T,
        console: Arc<dyn Console>,
        running: Arc<AtomicBool>,
        outbound_topic: String,
    ) -> Self {
        Self {
            transport,
            console,
            running,
            outbound_topic,
        }
    }

    /// Run until the running flag goes false or console input ends.
    ///
    /// Publish failures are reported and the loop continues; the original
    /// client would have crashed here, so surviving them is a deliberate
    /// improvement.
    pub async fn run(&self) -> ChatResult<()> {
        let prompt = format!("Enter a message to send to {}:", self.outbound_topic);

        while self.running.load(Ordering::SeqCst) {
            let Some(line) = self.read_console_line(&prompt).await? else {
                info!("console input closed; ending chat");
                break;
            };

            if let Err(e) = self
                .transport
                .publish(&self.outbound_topic, line.into_bytes())
                .await
            {
                warn!(topic = %self.outbound_topic, error = %e, "failed to publish message");
                self.console
                    .write_line(&format!("Could not send message: {e}"));
            }
        }

        info!("session loop stopped");
        Ok(())
    }

    /// Blocking console read, moved off the async runtime.
    async fn read_console_line(&self, prompt: &str) -> ChatResult<Option<String>> {
        let console = Arc::clone(&self.console);
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || console.read_line(&prompt))
            .await
            .map_err(|e| {
                ChatError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?
            .map_err(ChatError::Io)
    }
}
