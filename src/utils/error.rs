//! Error types for the transfer monitor.
//!
//! Each pipeline stage owns a narrow error enum ([`DecodeError`], [`ResolveError`],
//! [`ShapeError`]). [`SolTrackError`] wraps them together with the startup and
//! transport failures so callers can decide whether a failure ends the process or
//! only the current notification.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolTrackError>;

/// Failures raised while decoding a serialized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}: needed {needed} more byte(s)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid compact length prefix at offset {offset}")]
    InvalidLength { offset: usize },

    #[error("unsupported message version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid message header: {0}")]
    InvalidHeader(String),

    #[error(
        "instruction {instruction} references account index {index} but only {account_count} account(s) are addressable"
    )]
    IndexOutOfBounds {
        instruction: usize,
        index: u8,
        account_count: usize,
    },

    #[error("{0} trailing byte(s) after message")]
    TrailingBytes(usize),
}

/// Failures raised while resolving instruction indices to public keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("account index {index} out of range for {account_count} account key(s)")]
    IndexOutOfRange { index: u8, account_count: usize },

    #[error("transfer instruction references {found} account(s), at least 2 are required")]
    MissingTransferAccounts { found: usize },
}

/// Pre/post balance arrays that cannot be compared position by position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} balance snapshots differ in length: {pre} pre vs {post} post")]
pub struct ShapeError {
    pub kind: &'static str,
    pub pre: usize,
    pub post: usize,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum SolTrackError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Fetch timed out after {0} second(s)")]
    FetchTimeout(u64),

    #[error("Decoding error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("Output error: {0}")]
    OutputError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SolTrackError {
    /// Returns `true` when the failure only affects the notification being
    /// processed and the monitor loop should move on to the next one.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RpcError(_)
                | Self::FetchTimeout(_)
                | Self::DecodeError(_)
                | Self::ResolveError(_)
                | Self::ShapeError(_)
                | Self::InternalError(_)
        )
    }
}
