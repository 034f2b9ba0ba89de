//! Request flow: chat line in, commands and explanation out.
//!
//! [`CommandBridge`] ties the pieces together. It classifies a chat line, builds the
//! prompt, awaits the remote service, parses the reply and sends the result back:
//! header and commands straight through the sink, explanation through paced delivery.
//! A failed request produces exactly one error line for the player and never
//! touches the delivery queue.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::bridge::dispatch::{start_delivery, DeliveryHandle, LineSink};
use crate::bridge::prompt::{Prompt, DEFAULT_INSTRUCTIONS};
use crate::bridge::render::{
    error_line, help_lines, loading_lines, quick_lines, rejected_line, render_reply, welcome_lines,
    Palette,
};
use crate::bridge::reply::parse_reply;
use crate::bridge::service::CompletionBackend;
use crate::bridge::trigger::{TriggerCommand, TriggerParser};
use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::sanitize_query;

/// What the host should do with the original chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatDisposition {
    /// Not ours; let it reach public chat.
    PassThrough,
    /// Handled by the bridge; cancel normal propagation.
    Suppressed,
}

pub struct CommandBridge<B, S> {
    trigger: TriggerParser,
    palette: Palette,
    instructions: String,
    max_query_chars: usize,
    backend: B,
    sink: Arc<S>,
    delivery: DeliveryHandle,
}

impl<B: CompletionBackend, S: LineSink> CommandBridge<B, S> {
    /// Build the bridge and spawn its delivery actor. Must run inside a Tokio runtime.
    pub fn new(config: &Config, backend: B, sink: Arc<S>) -> Self {
        let delivery = start_delivery(&config.delivery, sink.clone());
        Self::with_delivery(config, backend, sink, delivery)
    }

    /// Build the bridge around an already running delivery actor.
    pub fn with_delivery(config: &Config, backend: B, sink: Arc<S>, delivery: DeliveryHandle) -> Self {
        Self {
            trigger: TriggerParser::from_config(&config.bridge),
            palette: Palette::new(config.bridge.color_codes),
            instructions: config
                .service
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            max_query_chars: config.bridge.max_query_chars,
            backend,
            sink,
            delivery,
        }
    }

    pub fn delivery(&self) -> &DeliveryHandle {
        &self.delivery
    }

    /// Early classification for hosts that must decide on cancellation synchronously.
    pub fn classify(&self, message: &str) -> TriggerCommand {
        self.trigger.parse(message)
    }

    /// Handle one chat message from `player`. Returns once the reply header and
    /// commands are sent; explanation lines keep trickling out afterwards.
    pub async fn handle_chat(&self, player: &str, message: &str) -> ChatDisposition {
        match self.trigger.parse(message) {
            TriggerCommand::Ignore => ChatDisposition::PassThrough,
            TriggerCommand::Help => {
                debug!("help requested by {}", player);
                self.send_all(player, help_lines(&self.palette, self.trigger.prefixes()));
                ChatDisposition::Suppressed
            }
            TriggerCommand::QuickList => {
                debug!("quick list requested by {}", player);
                self.send_all(player, quick_lines(&self.palette, self.trigger.primary()));
                ChatDisposition::Suppressed
            }
            TriggerCommand::Query(raw_query) => {
                match sanitize_query(&raw_query, self.max_query_chars) {
                    Ok(query) => self.answer(player, &query).await,
                    Err(e) => {
                        debug!("rejected query from {}: {}", player, e);
                        self.send(player, &rejected_line(&self.palette, &e));
                    }
                }
                ChatDisposition::Suppressed
            }
        }
    }

    /// Greeting for a player who just joined.
    pub fn greet(&self, player: &str) {
        self.send_all(player, welcome_lines(&self.palette, self.trigger.prefixes()));
    }

    async fn answer(&self, player: &str, query: &str) {
        let request_id = Uuid::new_v4();
        info!("[{}] query from {}: '{}'", request_id, player, escape_log(query));
        self.send_all(player, loading_lines(&self.palette));

        let prompt = Prompt::new(self.instructions.as_str(), query);
        metrics::inc_requests_started();
        let started = Instant::now();
        let result = self.backend.complete(&prompt).await;
        metrics::observe_request_latency(started);

        match result {
            Ok(raw) => {
                debug!("[{}] reply: '{}'", request_id, escape_log(&raw));
                let reply = parse_reply(&raw);
                metrics::add_commands_extracted(reply.commands.len());
                info!(
                    "[{}] {} command(s) extracted for {}",
                    request_id,
                    reply.commands.len(),
                    player
                );
                let rendered = render_reply(&self.palette, &reply);
                self.send_all(player, rendered.immediate);
                self.delivery.enqueue(player, rendered.paced);
            }
            Err(e) => {
                metrics::inc_requests_failed();
                warn!("[{}] request for {} failed: {}", request_id, player, e);
                self.send(player, &error_line(&self.palette, &e));
            }
        }
    }

    fn send_all(&self, player: &str, lines: Vec<String>) {
        for line in lines {
            self.send(player, &line);
        }
    }

    fn send(&self, player: &str, line: &str) {
        if let Err(e) = self.sink.send_line(player, line) {
            warn!("send to {} failed: {}", player, e);
        }
    }
}
