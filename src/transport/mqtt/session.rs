//! Impure I/O operations for the MQTT session
//!
//! Owns the single rumqttc client and its background event-loop task.
//! Received publishes are forwarded over an mpsc channel to the inbound
//! listener; connection state is published on a watch channel so connect
//! can wait for the broker's ConnAck.

use super::connection::{
    configure_mqtt_options, route_mqtt_event, EventRoute, InboundMessage, RetryConfig,
    SessionError, SessionState,
};
use crate::config::{ChatConfig, Credentials};
use crate::transport::MessageTransport;
use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Bound for the in-flight request queue between client and event loop
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Bound for the inbound message channel to the listener
const INBOUND_CHANNEL_CAPACITY: usize = 100;

/// Timeout waiting for the broker's ConnAck on each connect attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the event-loop task to wind down on disconnect
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// MQTT session: one broker connection, owned for the process lifetime
pub struct MqttSession {
    device_id: String,
    client: AsyncClient,
    event_loop_handle: Option<JoinHandle<()>>,
    state_rx: watch::Receiver<SessionState>,
    shutdown_tx: watch::Sender<bool>,
}

impl MqttSession {
    /// Connect to the broker with mutual-TLS authentication.
    ///
    /// Performs up to `retry.max_attempts` connect attempts with backoff
    /// between them, waiting for ConnAck on each. Returns the session plus
    /// the receiving end of the inbound message channel; messages arriving
    /// on subscribed topics are delivered there by the background task.
    pub async fn connect(
        device_id: &str,
        config: &ChatConfig,
        credentials: &Credentials,
        retry: RetryConfig,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>), SessionError> {
        let mut last_error = SessionError::ConnectionFailed("no connect attempt made".to_string());

        for attempt in 1..=retry.max_attempts.max(1) {
            if attempt > 1 {
                let delay = retry.calculate_backoff_delay(attempt - 1);
                info!(
                    attempt,
                    max_attempts = retry.max_attempts,
                    delay_ms = delay,
                    "retrying broker connection"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match Self::connect_once(device_id, config, credentials).await {
                Ok(connected) => return Ok(connected),
                Err(e) => {
                    warn!(attempt, error = %e, "broker connection attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Single connect attempt: build the client, spawn the event loop,
    /// wait for ConnAck.
    async fn connect_once(
        device_id: &str,
        config: &ChatConfig,
        credentials: &Credentials,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>), SessionError> {
        let options = configure_mqtt_options(device_id, config, credentials);
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        let handle = tokio::spawn(Self::run_event_loop(
            device_id.to_string(),
            event_loop,
            state_tx,
            shutdown_rx,
            inbound_tx,
        ));

        let session = Self {
            device_id: device_id.to_string(),
            client,
            event_loop_handle: Some(handle),
            state_rx: state_rx.clone(),
            shutdown_tx,
        };

        Self::wait_for_connection_confirmation(state_rx, CONNECT_TIMEOUT).await?;
        info!(device_id = %session.device_id, "connected to broker");
        Ok((session, inbound_rx))
    }

    /// Drive the rumqttc event loop until shutdown or a fatal error.
    ///
    /// There is no reconnection here: a lost connection flips the state to
    /// `Disconnected` and the task exits, which also closes the inbound
    /// channel.
    async fn run_event_loop(
        device_id: String,
        mut event_loop: EventLoop,
        state_tx: watch::Sender<SessionState>,
        mut shutdown_rx: watch::Receiver<bool>,
        inbound_tx: mpsc::Sender<InboundMessage>,
    ) {
        debug!(device_id = %device_id, "MQTT event loop started");
        loop {
            tokio::select! {
                // Shutdown signal takes priority over pending events
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!(device_id = %device_id, "shutdown signal received, stopping event loop");
                        let _ = state_tx.send(SessionState::Disconnected(
                            "client disconnected".to_string(),
                        ));
                        break;
                    }
                }

                event = event_loop.poll() => {
                    match event {
                        Ok(event) => match route_mqtt_event(&event) {
                            EventRoute::ConnectionAcknowledged => {
                                let _ = state_tx.send(SessionState::Connected);
                            }
                            EventRoute::MessageReceived { topic, payload, retain } => {
                                // Retained messages are stale chat lines from a
                                // previous session; skip them
                                if retain {
                                    debug!(topic = %topic, "ignoring retained message");
                                } else if inbound_tx
                                    .send(InboundMessage { topic, payload })
                                    .await
                                    .is_err()
                                {
                                    warn!("inbound receiver dropped; message discarded");
                                }
                            }
                            EventRoute::Disconnected => {
                                let _ = state_tx.send(SessionState::Disconnected(
                                    "broker closed the connection".to_string(),
                                ));
                                break;
                            }
                            EventRoute::SubscriptionConfirmed { packet_id, failed } => {
                                if failed {
                                    error!(packet_id, "broker rejected subscription");
                                } else {
                                    debug!(packet_id, "subscription confirmed");
                                }
                            }
                            EventRoute::InfrastructureEvent(event_str) => {
                                debug!(event = %event_str, "MQTT event");
                            }
                            EventRoute::OutgoingEvent => {}
                        },
                        Err(e) => {
                            error!(device_id = %device_id, error = %e, "MQTT event loop error");
                            let _ = state_tx.send(SessionState::Disconnected(e.to_string()));
                            break;
                        }
                    }
                }
            }
        }
        debug!(device_id = %device_id, "MQTT event loop stopped");
    }

    /// Wait for connection confirmation (ConnAck) with a timeout.
    async fn wait_for_connection_confirmation(
        mut state_rx: watch::Receiver<SessionState>,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let wait = async {
            loop {
                match state_rx.borrow_and_update().clone() {
                    SessionState::Connected => return Ok(()),
                    SessionState::Disconnected(reason) => {
                        return Err(SessionError::ConnectionFailed(reason));
                    }
                    SessionState::Connecting => {}
                }
                if state_rx.changed().await.is_err() {
                    return Err(SessionError::ConnectionFailed(
                        "state channel closed".to_string(),
                    ));
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::ConnectionFailed(
                "timed out waiting for broker ConnAck".to_string(),
            )),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Guard operations against use outside the Connected state.
    fn check_connection_state(&self) -> Result<(), SessionError> {
        let state = self.state();
        if !state.can_operate() {
            return Err(SessionError::NotConnected { state });
        }
        Ok(())
    }

    /// Subscribe to a topic at QoS 1.
    pub async fn subscribe(&self, topic: &str) -> Result<(), SessionError> {
        self.check_connection_state()?;

        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| SessionError::SubscriptionFailed(Box::new(e)))?;

        info!(topic = %topic, "subscribed");
        Ok(())
    }

    /// Publish a payload to a topic at QoS 1, not retained.
    pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SessionError> {
        self.check_connection_state()?;

        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| SessionError::PublishFailed(Box::new(e)))?;

        debug!(topic = %topic, "published message");
        Ok(())
    }

    /// Disconnect from the broker and stop the event-loop task.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        let _ = self.shutdown_tx.send(true);

        // Best effort: the request channel may already be closed if the
        // event loop exited on error
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "disconnect request not delivered");
        }

        if let Some(handle) = self.event_loop_handle.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => debug!("event loop task shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!(error = %e, "event loop task ended with error");
                }
                Err(_) => {
                    warn!("event loop task did not shut down in time, aborting");
                }
                _ => {}
            }
        }

        info!(device_id = %self.device_id, "disconnected from broker");
        Ok(())
    }
}

#[async_trait]
impl MessageTransport for MqttSession {
    type Error = SessionError;

    async fn subscribe(&self, topic: &str) -> Result<(), Self::Error> {
        MqttSession::subscribe(self, topic).await
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error> {
        MqttSession::publish(self, topic, payload).await
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        MqttSession::disconnect(self).await
    }

    fn is_connected(&self) -> bool {
        self.state().can_operate()
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        // Signal shutdown to the background task if still running; callers
        // should use disconnect() for a graceful teardown
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}
