//! UNO game-session server.
//!
//! Hosts a single game session behind an HTTP + SSE API. All game logic
//! lives in `uno_engine`; this binary only wires configuration, logging,
//! the disconnect watcher, and the transport together.

mod api;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use serde_json::{Map, json};
use uno_engine::{EngineConfig, Game, watcher};

const HELP: &str = "\
Run an UNO game session server

USAGE:
  uno_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env UNO_SERVER_BIND or 127.0.0.1:8080]
  --capacity   N           Initial player capacity     [default: env UNO_PLAYER_CAPACITY or 8]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  UNO_SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  UNO_PLAYER_CAPACITY          Initial player capacity
  UNO_WATCHER_INTERVAL_MS      Watcher tick interval in milliseconds
  UNO_WATCHER_SKIP_THRESHOLD   Consecutive slow ticks before a warning
  UNO_PLAYER_TIMEOUT_MS        Pending-delivery timeout before a player counts as disconnected
  UNO_QUEUE_CAPACITY           Per-player outbound event queue capacity
  (See .env file for all configuration options)
";

struct Args {
    bind: SocketAddr,
    capacity: Option<usize>,
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn engine_config_from_env() -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        watcher_interval: Duration::from_millis(parse_env_or(
            "UNO_WATCHER_INTERVAL_MS",
            defaults.watcher_interval.as_millis() as u64,
        )),
        watcher_skip_threshold: parse_env_or(
            "UNO_WATCHER_SKIP_THRESHOLD",
            defaults.watcher_skip_threshold,
        ),
        player_timeout: Duration::from_millis(parse_env_or(
            "UNO_PLAYER_TIMEOUT_MS",
            defaults.player_timeout.as_millis() as u64,
        )),
        queue_capacity: parse_env_or("UNO_QUEUE_CAPACITY", defaults.queue_capacity),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.value_from_str("--bind").unwrap_or_else(|_| {
            std::env::var("UNO_SERVER_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
                .parse()
                .expect("Invalid UNO_SERVER_BIND address")
        }),
        capacity: pargs
            .opt_value_from_str("--capacity")?
            .or_else(|| std::env::var("UNO_PLAYER_CAPACITY").ok().and_then(|v| v.parse().ok())),
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();
    info!("Starting UNO session server at {}", args.bind);

    let game = Arc::new(Game::new(engine_config_from_env()));

    // The capacity flag is an ordinary rule update applied before anyone joins.
    if let Some(capacity) = args.capacity {
        let updates: Map<String, serde_json::Value> = [(
            "player_capacity".to_string(),
            json!(capacity),
        )]
        .into_iter()
        .collect();
        game.update_rules(&updates, None)
            .map_err(|e| anyhow::anyhow!("Invalid --capacity value: {e}"))?;
    }

    tokio::spawn(watcher::run(Arc::clone(&game)));

    let app = api::create_router(api::AppState { game });
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
