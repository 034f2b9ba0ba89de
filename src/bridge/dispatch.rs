//! Paced per-player delivery of multi-line replies.
//!
//! Chat clients drop or reorder lines when a burst of messages arrives in the same
//! tick, so long explanations are trickled out one line at a time with a fixed gap.
//! This module owns that pacing.
//!
//! Design:
//! * A single actor task owns the queue map (`player id -> pending lines`). All
//!   mutation happens inside that task; callers talk to it through a cloneable
//!   [`DeliveryHandle`] over an unbounded channel, so no locks guard the map.
//! * An entry is created on the first enqueue for a player and removed as soon as
//!   its last line has been handed to the sink. Entry present == drain active, which
//!   makes "one drain per player" structural rather than a flag to keep in sync.
//! * Each entry carries the instant its next line is due. The actor sleeps until
//!   the earliest due instant (or the next command) and then delivers exactly one
//!   line for every due player. Different players never wait on each other.
//! * Delivery is at-most-once and best effort. A failing sink is logged and the
//!   line counted as attempted; the drain moves on. No retry, no backpressure.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::DeliveryConfig;
use crate::logutil::{escape_log, strip_formatting};
use crate::metrics;

/// Player identifier as handed over by the game host.
pub type RecipientId = String;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("recipient {0} is not connected")]
    RecipientGone(String),
    #[error("output channel closed")]
    Closed,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One-line-at-a-time text sink towards players.
pub trait LineSink: Send + Sync + 'static {
    fn send_line(&self, recipient: &str, line: &str) -> Result<(), DeliveryError>;
}

/// A line addressed to one player, as carried over channels and the stdio host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingLine {
    pub to: RecipientId,
    pub text: String,
}

impl LineSink for mpsc::UnboundedSender<OutgoingLine> {
    fn send_line(&self, recipient: &str, line: &str) -> Result<(), DeliveryError> {
        self.send(OutgoingLine {
            to: recipient.to_string(),
            text: line.to_string(),
        })
        .map_err(|_| DeliveryError::Closed)
    }
}

enum DeliveryCommand {
    Enqueue {
        recipient: RecipientId,
        lines: Vec<String>,
    },
    Snapshot(oneshot::Sender<DeliveryStats>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Players with a drain in progress.
    pub active_recipients: usize,
    /// Lines waiting across all players.
    pub queued_lines: usize,
    pub delivered_total: u64,
    pub failed_total: u64,
}

#[derive(Debug)]
struct PendingLines {
    lines: VecDeque<String>,
    next_due: Instant,
}

#[derive(Clone, Debug)]
pub struct DeliveryHandle {
    tx: mpsc::UnboundedSender<DeliveryCommand>,
}

impl DeliveryHandle {
    /// Append `lines` to the player's pending output. Starts a drain when the player
    /// had nothing pending; otherwise the running drain picks the lines up in order.
    pub fn enqueue<I, L>(&self, recipient: &str, lines: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            return;
        }
        if self
            .tx
            .send(DeliveryCommand::Enqueue {
                recipient: recipient.to_string(),
                lines,
            })
            .is_err()
        {
            warn!("delivery actor stopped; dropping lines for {}", recipient);
        }
    }

    pub async fn snapshot(&self) -> Option<DeliveryStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(DeliveryCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    /// Stop the actor. Lines still pending are discarded.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(DeliveryCommand::Shutdown(tx));
        let _ = rx.await;
    }
}

/// Spawn the delivery actor on the current Tokio runtime.
pub fn start_delivery<S: LineSink>(cfg: &DeliveryConfig, sink: Arc<S>) -> DeliveryHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<DeliveryCommand>();
    let handle = DeliveryHandle { tx };
    let line_delay = cfg.line_delay();
    let stats_interval = Duration::from_millis(cfg.stats_interval_ms);

    tokio::spawn(async move {
        let mut queues: HashMap<RecipientId, PendingLines> = HashMap::new();
        let mut stats = DeliveryStats::default();
        let mut last_stats_log = Instant::now();
        // Parked deadline when nothing is pending; the branch is disabled then anyway
        const IDLE: Duration = Duration::from_secs(3600);

        loop {
            let next_due = queues.values().map(|p| p.next_due).min();
            tokio::select! {
                cmd = rx.recv() => {
                    match cmd {
                        Some(DeliveryCommand::Enqueue { recipient, lines }) => {
                            match queues.entry(recipient) {
                                Entry::Occupied(mut e) => {
                                    trace!("appending {} lines to active drain for {}", lines.len(), e.key());
                                    e.get_mut().lines.extend(lines);
                                }
                                Entry::Vacant(e) => {
                                    trace!("starting drain for {} with {} lines", e.key(), lines.len());
                                    e.insert(PendingLines {
                                        lines: lines.into(),
                                        next_due: Instant::now(),
                                    });
                                }
                            }
                        }
                        Some(DeliveryCommand::Snapshot(resp)) => {
                            let _ = resp.send(DeliveryStats {
                                active_recipients: queues.len(),
                                queued_lines: queues.values().map(|p| p.lines.len()).sum(),
                                ..stats.clone()
                            });
                        }
                        Some(DeliveryCommand::Shutdown(done)) => {
                            let dropped: usize = queues.values().map(|p| p.lines.len()).sum();
                            if dropped > 0 {
                                debug!("delivery shutdown discarding {} pending lines", dropped);
                            }
                            let _ = done.send(());
                            break;
                        }
                        // Every handle dropped
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(next_due.unwrap_or_else(|| Instant::now() + IDLE)), if next_due.is_some() => {}
            }

            let now = Instant::now();
            drain_due(&mut queues, now, line_delay, sink.as_ref(), &mut stats);

            if !stats_interval.is_zero() && now.duration_since(last_stats_log) >= stats_interval {
                debug!(
                    "delivery stats: active={} delivered_total={} failed_total={}",
                    queues.len(),
                    stats.delivered_total,
                    stats.failed_total
                );
                last_stats_log = now;
            }
        }
        debug!("delivery loop terminated");
    });

    handle
}

/// Deliver one line to every player whose next line is due, then drop emptied entries.
fn drain_due<S: LineSink + ?Sized>(
    queues: &mut HashMap<RecipientId, PendingLines>,
    now: Instant,
    line_delay: Duration,
    sink: &S,
    stats: &mut DeliveryStats,
) {
    queues.retain(|recipient, pending| {
        if pending.next_due > now {
            return true;
        }
        if let Some(line) = pending.lines.pop_front() {
            match sink.send_line(recipient, &line) {
                Ok(()) => {
                    stats.delivered_total += 1;
                    metrics::inc_lines_delivered();
                }
                Err(e) => {
                    stats.failed_total += 1;
                    metrics::inc_lines_failed();
                    warn!("line delivery to {} failed: {} (line='{}')", recipient, e, escape_log(&strip_formatting(&line)));
                }
            }
        }
        if pending.lines.is_empty() {
            trace!("drain for {} finished", recipient);
            false
        } else {
            pending.next_due = now + line_delay;
            true
        }
    });
}
