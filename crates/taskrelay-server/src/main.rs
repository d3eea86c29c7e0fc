//! TaskRelay server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use taskrelay_core::tracing_init::init_tracing;
use taskrelay_server::agent::StdioAgent;
use taskrelay_server::registry::{ConnectionRegistry, DEFAULT_REPLAY_CAPACITY};
use taskrelay_server::relay::RelayServer;
use taskrelay_server::server;

#[derive(Parser, Debug)]
#[command(name = "taskrelay-server")]
#[command(about = "Relay a task agent's event stream to WebSocket and HTTP clients")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "TASKRELAY_ADDR", default_value = "127.0.0.1:7777")]
    addr: SocketAddr,

    /// Host agent command to spawn
    #[arg(long, env = "TASKRELAY_AGENT_CMD")]
    agent_cmd: String,

    /// Argument for the host agent command (repeatable)
    #[arg(long = "agent-arg")]
    agent_args: Vec<String>,

    /// Number of recent events replayed to newly connected clients
    #[arg(long, default_value_t = DEFAULT_REPLAY_CAPACITY)]
    replay_capacity: usize,

    /// Emit logs as JSON
    #[arg(long, env = "TASKRELAY_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("taskrelay_server=info,taskrelay_core=info,tower_http=warn", args.log_json);

    let (agent, mut agent_events) = StdioAgent::spawn(&args.agent_cmd, &args.agent_args)
        .context("failed to spawn host agent")?;
    let agent = Arc::new(agent);

    let registry = Arc::new(ConnectionRegistry::new(args.replay_capacity));
    let relay = Arc::new(RelayServer::new(registry, agent));

    let pump_relay = Arc::clone(&relay);
    tokio::spawn(async move {
        while let Some(event) = agent_events.recv().await {
            pump_relay.handle_agent_event(event).await;
        }
        info!("Agent event stream ended");
    });

    let app = server::router(relay);
    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    info!(addr = %args.addr, replay_capacity = args.replay_capacity, "Relay server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Relay server stopped");
    Ok(())
}
