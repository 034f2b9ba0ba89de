//! JSON-lines stdio host.
//!
//! A game-side plugin pipes player events to the bridge on stdin and relays the
//! bridge's output lines back into the world from stdout. One JSON object per line
//! in each direction:
//!
//! ```text
//! in : {"type":"chat","player":"steve","message":"!cmd make it day"}
//!      {"type":"join","player":"steve"}
//!      {"type":"leave","player":"steve"}
//! out: {"to":"steve","text":"1. /time set day"}
//! ```
//!
//! Logging goes to stderr so stdout stays a clean protocol stream.

use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use crate::bridge::dispatch::{DeliveryError, LineSink};
use crate::bridge::service::CompletionBackend;
use crate::bridge::CommandBridge;
use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostEvent {
    Chat { player: String, message: String },
    Join { player: String },
    Leave { player: String },
}

pub fn parse_event(line: &str) -> Result<HostEvent, serde_json::Error> {
    serde_json::from_str(line)
}

#[derive(Serialize)]
struct WireLine<'a> {
    to: &'a str,
    text: &'a str,
}

/// Writes output lines as JSON to a writer, refusing players that have left.
pub struct JsonLineSink {
    online: Mutex<HashSet<String>>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLineSink {
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            online: Mutex::new(HashSet::new()),
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn mark_online(&self, player: &str) {
        self.online
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(player.to_string());
    }

    pub fn mark_offline(&self, player: &str) {
        self.online
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(player);
    }

    pub fn is_online(&self, player: &str) -> bool {
        self.online
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(player)
    }
}

impl LineSink for JsonLineSink {
    fn send_line(&self, recipient: &str, line: &str) -> Result<(), DeliveryError> {
        if !self.is_online(recipient) {
            return Err(DeliveryError::RecipientGone(recipient.to_string()));
        }
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        serde_json::to_writer(&mut *out, &WireLine { to: recipient, text: line })
            .map_err(std::io::Error::from)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

/// Run the bridge against stdin/stdout until stdin closes or Ctrl-C.
pub async fn run_stdio<B: CompletionBackend>(config: Config, backend: B) -> Result<()> {
    let sink = Arc::new(JsonLineSink::stdout());
    let bridge = Arc::new(CommandBridge::new(&config, backend, sink.clone()));
    let welcome_delay = Duration::from_millis(config.bridge.welcome_delay_ms);
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Bridge listening for host events on stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match parse_event(&line) {
                        Ok(event) => route_event(event, &bridge, &sink, welcome_delay, &mut tasks),
                        Err(e) => warn!("ignoring malformed host event '{}': {}", escape_log(&line), e),
                    },
                    None => {
                        info!("stdin closed; finishing in-flight requests");
                        break;
                    }
                }
            }
            Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = res {
                    warn!("chat task failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                tasks.abort_all();
                bridge.delivery().shutdown().await;
                return Ok(());
            }
        }
    }

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            warn!("chat task failed: {}", e);
        }
    }
    // Let queued explanations finish before exiting
    while let Some(stats) = bridge.delivery().snapshot().await {
        if stats.active_recipients == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    bridge.delivery().shutdown().await;
    info!("session totals: {:?}", metrics::snapshot());
    Ok(())
}

fn route_event<B: CompletionBackend>(
    event: HostEvent,
    bridge: &Arc<CommandBridge<B, JsonLineSink>>,
    sink: &Arc<JsonLineSink>,
    welcome_delay: Duration,
    tasks: &mut JoinSet<()>,
) {
    match event {
        HostEvent::Chat { player, message } => {
            sink.mark_online(&player);
            if !bridge.classify(&message).suppresses_chat() {
                return;
            }
            let bridge = bridge.clone();
            tasks.spawn(async move {
                bridge.handle_chat(&player, &message).await;
            });
        }
        HostEvent::Join { player } => {
            debug!("player joined: {}", player);
            sink.mark_online(&player);
            if welcome_delay.is_zero() {
                return;
            }
            let bridge = bridge.clone();
            tasks.spawn(async move {
                tokio::time::sleep(welcome_delay).await;
                bridge.greet(&player);
            });
        }
        HostEvent::Leave { player } => {
            debug!("player left: {}", player);
            sink.mark_offline(&player);
        }
    }
}
