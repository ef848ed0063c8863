pub mod balance;
pub mod classifier;
pub mod decoder;
pub mod emitter;
pub mod fetcher;
pub mod monitor;
pub mod pipeline;
pub mod resolver;

pub use decoder::{Decoder, decode_transaction};
pub use emitter::Emitter;
pub use fetcher::{RpcFetcher, TransactionFetcher};
pub use monitor::{Monitor, MonitorStats};
pub use pipeline::Pipeline;
pub use resolver::AccountTable;
