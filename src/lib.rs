//! # cmdbridge - Chat Command Bridge for Game Servers
//!
//! cmdbridge watches in-game chat for requests such as `!cmd give me 10 diamond swords`,
//! asks a hosted generative-language model for the matching game commands, and sends
//! the answer back to the player: the extracted commands first, then the explanation
//! trickled out line by line so the chat client keeps up.
//!
//! ## Features
//!
//! - **Trigger Prefixes**: Primary `!cmd` plus a localized alias `!커맨드`; a bare prefix shows help,
//!   `!quick` lists canned example queries.
//! - **Reply Parsing**: Fenced code blocks become command strings (language tags such as
//!   `minecraft` stripped); the rest becomes the explanation. Total over any input.
//! - **Paced Delivery**: One ordered drain per player with a fixed gap between lines; players
//!   never wait on each other.
//! - **Stdio Host**: JSON-lines protocol so any game-side plugin can drive the bridge.
//! - **Async Design**: Built with Tokio; the remote call is the only suspension point.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cmdbridge::bridge::service::GeminiClient;
//! use cmdbridge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let backend = GeminiClient::new(config.service.clone());
//!     cmdbridge::host::run_stdio(config, backend).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bridge`] - Trigger parsing, remote service, reply parsing, rendering and paced delivery
//! - [`host`] - JSON-lines stdio adapter towards the game server
//! - [`config`] - Configuration management
//! - [`validation`] - Query sanitization
//! - [`metrics`] - Process-wide counters
//! - [`logutil`] - Single-line log escaping

pub mod bridge;
pub mod config;
pub mod host;
pub mod logutil;
pub mod metrics;
pub mod validation;
