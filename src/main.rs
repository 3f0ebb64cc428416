//! iotchat - Main entry point
//!
//! Startup sequence: load config and credentials, derive topics, connect
//! with mutual TLS, subscribe to the inbound topic, then run the inbound
//! listener and the console loop concurrently until the sentinel (or
//! Ctrl-C) ends the session.

use clap::Parser;
use iotchat::chat::{InboundListener, SessionLoop};
use iotchat::config::{validate_device_id, ChatConfig};
use iotchat::console::{Console, StdConsole};
use iotchat::error::ChatResult;
use iotchat::identity::TopicPair;
use iotchat::observability::init_default_logging;
use iotchat::transport::mqtt::RetryConfig;
use iotchat::transport::MqttTransport;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Two-party MQTT chat client
#[derive(Parser)]
#[command(name = "iotchat")]
#[command(about = "Two-party MQTT chat client with mutual-TLS broker authentication")]
#[command(version)]
struct Cli {
    /// Endpoint configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "endpoint.json")]
    config: PathBuf,

    /// Local device identity (determines both chat topics)
    #[arg(short, long, env = "CHAT_DEVICE")]
    device: String,

    /// Make a single connect attempt instead of retrying with backoff
    #[arg(long)]
    no_retry: bool,
}

fn retry_config(no_retry: bool) -> RetryConfig {
    if no_retry {
        RetryConfig::no_retry()
    } else {
        RetryConfig::default()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting iotchat v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_chat(cli).await {
        error!("Fatal: {e}");
        process::exit(1);
    }

    info!("Chat session ended");
}

async fn run_chat(cli: Cli) -> ChatResult<()> {
    validate_device_id(&cli.device)?;

    info!(config = %cli.config.display(), "Loading configuration");
    let config = ChatConfig::load_from_file(&cli.config)?;
    let credentials = config.load_credentials()?;

    let topics = TopicPair::for_device(&cli.device);
    info!(
        device = %cli.device,
        inbound = %topics.inbound,
        outbound = %topics.outbound,
        "Derived chat topics"
    );

    // Startup failures past this point are fatal; messaging never starts
    // on a half-connected session
    let retry = retry_config(cli.no_retry);
    let (mut session, inbound) =
        MqttTransport::connect(&cli.device, &config, &credentials, retry).await?;
    session.subscribe(&topics.inbound).await?;

    let running = Arc::new(AtomicBool::new(true));
    let console: Arc<dyn Console> = Arc::new(StdConsole);

    let listener = InboundListener::new(Arc::clone(&console), Arc::clone(&running));
    let listener_handle = tokio::spawn(listener.run(inbound));

    let session_loop = SessionLoop::new(
        &session,
        Arc::clone(&console),
        Arc::clone(&running),
        topics.outbound.clone(),
    );

    tokio::select! {
        result = session_loop.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }

    session.disconnect().await?;

    // Disconnecting closes the inbound channel, which ends the listener;
    // any handler still in flight is best-effort at exit
    listener_handle.abort();

    Ok(())
}
