//! Binary entrypoint for the cmdbridge CLI.
//!
//! Commands:
//! - `start` - run the bridge against a game host over stdin/stdout (JSON lines)
//! - `init` - create a starter `config.toml`
//! - `ask <query>` - send one query and print the parsed commands and explanation
//!
//! See the library crate docs for module‑level details: `cmdbridge::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use cmdbridge::bridge::prompt::{Prompt, DEFAULT_INSTRUCTIONS};
use cmdbridge::bridge::reply::parse_reply;
use cmdbridge::bridge::service::{CompletionBackend, GeminiClient};
use cmdbridge::config::Config;
use cmdbridge::validation::sanitize_query;

#[derive(Parser)]
#[command(name = "cmdbridge")]
#[command(about = "Chat-command bridge: turns in-game chat requests into generated game commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge, reading host events from stdin
    Start,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Send a single query and print the parsed reply
    Ask {
        /// What you want the commands to do
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init has no config to read yet; a missing file falls back to defaults elsewhere
    let pre_config = match cli.command {
        Commands::Init { .. } => None,
        _ => match Config::load(&cli.config).await {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!("{e}; using defaults");
                None
            }
        },
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = pre_config.unwrap_or_else(default_with_env);
            info!("Starting cmdbridge v{}", env!("CARGO_PKG_VERSION"));
            if !config.service.is_configured() {
                warn!("No API key configured; every query will fail until one is set");
            }
            let backend = GeminiClient::new(config.service.clone());
            cmdbridge::host::run_stdio(config, backend).await?;
        }
        Commands::Init { force } => {
            if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                return Err(anyhow!(
                    "{} already exists (use --force to overwrite)",
                    cli.config
                ));
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Ask { query } => {
            let config = pre_config.unwrap_or_else(default_with_env);
            let query = sanitize_query(&query.join(" "), config.bridge.max_query_chars)?;
            let instructions = config
                .service
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());
            let client = GeminiClient::new(config.service.clone());
            let raw = client.complete(&Prompt::new(instructions, query)).await?;
            let reply = parse_reply(&raw);
            for (i, cmd) in reply.visible_commands().enumerate() {
                println!("{}. {}", i + 1, cmd);
            }
            if !reply.explanation.is_empty() {
                println!();
                println!("{}", reply.explanation);
            }
        }
    }

    Ok(())
}

fn default_with_env() -> Config {
    let mut config = Config::default();
    config.apply_env();
    config
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Config level is the floor; CLI verbosity can only raise it
    let config_level = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => config_level,
        1 => config_level.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // stdout carries the host protocol; logs always go to stderr
    builder.target(env_logger::Target::Stderr);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the terminal only when someone is watching stderr
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
