//! `soltrack` - watches one Solana wallet and reports its transfers.
//!
//! Every transaction that mentions the watched wallet is fetched, decoded
//! from its raw wire bytes and checked for System Program (native SOL) and
//! SPL Token Program instructions. Each recognized transfer becomes one line
//! on standard output; all diagnostics go to standard error.
//!
//! # Quick Start
//!
//! ```no_run
//! use soltrack::{Emitter, Monitor, MonitorConfigBuilder, RpcFetcher, WebSocketSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dotenvy::dotenv().ok();
//!
//!     let config = MonitorConfigBuilder::new()
//!         .wallet("4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T")
//!         .with_rpc(std::env::var("RPC_URL")?)
//!         .with_ws(std::env::var("WS_URL")?)
//!         .build()?;
//!
//!     let mut source =
//!         WebSocketSource::new(&config.ws_url, config.wallet, config.commitment_level);
//!     source.connect().await?;
//!
//!     let fetcher = RpcFetcher::new(&config.rpc_url, config.commitment_level.into());
//!     let mut monitor = Monitor::new(config, fetcher, Emitter::stdout());
//!     monitor.run(source).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! 1. **`WebSocketSource`** - `logsSubscribe` notifications mentioning the wallet
//! 2. **`RpcFetcher`** - `getTransaction` in base64 with balance metadata
//! 3. **`Decoder`** - legacy and v0 wire format into a typed [`Transaction`]
//! 4. **`AccountTable`** - instruction account indices to public keys
//! 5. **Classifier** - System, Token or unknown program
//! 6. **Balance calculators** - native and token deltas from pre/post balances
//! 7. **`Emitter`** - one line per [`TransferEvent`]
//!
//! Steps 3 to 6 are pure and live in [`Pipeline`]; [`Monitor`] drives the
//! loop, contains failures to the notification that caused them and closes
//! the subscription on shutdown.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Public API exports
pub use config::{CommitmentLevel, MonitorConfig, MonitorConfigBuilder};
pub use crate::core::balance::{LAMPORTS_PER_SOL, TokenDelta, TokenDeltaStrategy};
pub use crate::core::classifier::{Strategy, TOKEN_PROGRAM_ID, classify};
pub use crate::core::decoder::{Decoder, decode_transaction};
pub use crate::core::emitter::Emitter;
pub use crate::core::fetcher::{RpcFetcher, TransactionFetcher};
pub use crate::core::monitor::{Monitor, MonitorStats};
pub use crate::core::pipeline::Pipeline;
pub use crate::core::resolver::AccountTable;
pub use streams::websocket::WebSocketSource;
pub use streams::{Notification, NotificationSource};
pub use types::events::{Asset, TransferEvent};
pub use types::metadata::{LoadedAddresses, RawTransactionRecord, TokenBalanceEntry};
pub use types::transaction::{Instruction, Message, ResolvedInstruction, Transaction};
pub use utils::error::{DecodeError, ResolveError, Result, ShapeError, SolTrackError};

// Module declarations
pub mod config;
pub mod core;
pub mod streams;
pub mod types;
pub mod utils;
