//! TaskRelay CLI binary.

use clap::Parser;

use taskrelay_cli::repl;
use taskrelay_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "taskrelay")]
#[command(about = "Interactive terminal client for a TaskRelay server")]
#[command(version)]
struct Args {
    /// Relay server WebSocket URL
    #[arg(long, env = "TASKRELAY_URL", default_value = "ws://127.0.0.1:7777/ws")]
    url: String,

    /// Emit logs as JSON
    #[arg(long, env = "TASKRELAY_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("taskrelay_cli=warn", args.log_json);

    repl::run(&args.url).await
}
