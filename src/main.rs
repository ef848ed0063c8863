//! `soltrack` command line.
//!
//! Watches one wallet and prints every native or token transfer it takes part
//! in. Endpoints come from flags or the `RPC_URL`/`WS_URL` environment
//! variables, which may also be set in a `.env` file.

#![warn(clippy::all, clippy::pedantic)]

use clap::Parser;
use soltrack::utils::logging::{self, LogLevel};
use soltrack::{
    CommitmentLevel, Emitter, Monitor, MonitorConfigBuilder, RpcFetcher, TokenDeltaStrategy,
    WebSocketSource, config::DEFAULT_FETCH_TIMEOUT_SECS,
};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "soltrack", version, about = "Report transfers of a Solana wallet as they happen")]
struct Cli {
    /// Wallet address to monitor (base58)
    #[arg(short, long)]
    wallet: String,

    /// HTTP(S) JSON-RPC endpoint
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// WebSocket endpoint
    #[arg(long, env = "WS_URL")]
    ws_url: Option<String>,

    #[arg(long, value_enum, default_value_t = CommitmentLevel::Finalized)]
    commitment: CommitmentLevel,

    /// Seconds to wait for a single transaction fetch
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    fetch_timeout: u64,

    /// Compute token deltas from raw amounts matched by account index
    #[arg(long)]
    token_amounts: bool,

    /// Show debug diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // The .env file must be loaded before clap reads the environment.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = &dotenv {
        if !e.not_found() {
            logging::log(LogLevel::Warning, &format!("Could not load .env: {e}"));
        }
    }

    let token_delta = if cli.token_amounts {
        TokenDeltaStrategy::Amount
    } else {
        TokenDeltaStrategy::Decimals
    };

    let mut builder = MonitorConfigBuilder::new()
        .wallet(cli.wallet)
        .with_commitment(cli.commitment)
        .with_fetch_timeout(cli.fetch_timeout)
        .with_token_delta(token_delta);
    if let Some(rpc_url) = cli.rpc_url {
        builder = builder.with_rpc(rpc_url);
    }
    if let Some(ws_url) = cli.ws_url {
        builder = builder.with_ws(ws_url);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            logging::log_error("Invalid configuration", &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    logging::log_startup(
        &config.wallet.to_string(),
        &config.rpc_url,
        &config.ws_url,
        config.commitment_level.as_str(),
    );

    let mut source = WebSocketSource::new(&config.ws_url, config.wallet, config.commitment_level);
    if let Err(e) = source.connect().await {
        logging::log_error("Subscription failed", &e.to_string());
        return ExitCode::FAILURE;
    }
    logging::log(LogLevel::Success, "Wallet validated! - Monitoring Transactions...");

    let fetcher = RpcFetcher::new(&config.rpc_url, config.commitment_level.into());
    let mut monitor = Monitor::new(config, fetcher, Emitter::stdout());

    let token = monitor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logging::log(LogLevel::Info, "Received Ctrl+C");
            token.cancel();
        }
    });

    match monitor.run(source).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::log_error("Monitor stopped", &e.to_string());
            ExitCode::FAILURE
        }
    }
}
