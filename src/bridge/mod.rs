//! # Bridge Core Module
//!
//! Turns chat requests into generated game commands and paces the answer back to
//! the player.
//!
//! ## Components
//!
//! - [`trigger`] - Recognizes `!cmd` / `!커맨드` requests, help and quick-list keywords
//! - [`prompt`] - Role instructions + player request
//! - [`service`] - Remote generative-language client behind [`service::CompletionBackend`]
//! - [`reply`] - Splits a reply into fenced commands and explanation prose
//! - [`render`] - Chat line layout and optional colour codes
//! - [`dispatch`] - Paced per-player delivery actor
//! - [`server`] - [`CommandBridge`], the request flow tying it all together
//!
//! ## Flow
//!
//! ```text
//! chat line ──► TriggerParser ──► Prompt ──► CompletionBackend
//!                                                  │
//!              LineSink ◄── header + commands ◄── parse_reply
//!                 ▲                                │
//!                 └──── paced delivery ◄── explanation lines
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cmdbridge::bridge::{CommandBridge, dispatch::OutgoingLine, service::GeminiClient};
//! use cmdbridge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<OutgoingLine>();
//!     let bridge = CommandBridge::new(&config, GeminiClient::new(config.service.clone()), Arc::new(tx));
//!     bridge.handle_chat("steve", "!cmd make it day").await;
//!     while let Some(line) = rx.recv().await {
//!         println!("{} <- {}", line.to, line.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod prompt;
pub mod render;
pub mod reply;
pub mod server;
pub mod service;
pub mod trigger;

pub use server::{ChatDisposition, CommandBridge};
