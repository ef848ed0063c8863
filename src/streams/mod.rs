//! Notification sources.
//!
//! A source yields one [`Notification`] per transaction that mentions the
//! watched wallet. The monitor only depends on [`NotificationSource`]; the
//! WebSocket subscription in [`websocket`] is the production implementation.

use crate::utils::error::{Result, SolTrackError};
use async_trait::async_trait;
use solana_sdk::signature::Signature;

pub mod websocket;

/// "The watched account was mentioned in this transaction."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub signature: Signature,
    /// Slot the notification was published for, `0` if unknown.
    pub slot: u64,
}

impl Notification {
    #[must_use]
    pub fn new(signature: Signature) -> Self {
        Self { signature, slot: 0 }
    }
}

#[async_trait]
pub trait NotificationSource: Send {
    /// Waits for the next notification.
    ///
    /// Returns `None` once the source has closed and `Some(Err(_))` when a
    /// single receive failed but the source is still usable.
    async fn next_notification(&mut self) -> Option<Result<Notification>>;

    /// Unsubscribes and releases the underlying connection.
    async fn close(&mut self);

    /// The transport failure that ended the source, if it did not close
    /// cleanly. Only meaningful after `next_notification` returned `None`.
    fn take_failure(&mut self) -> Option<SolTrackError> {
        None
    }

    /// Short name used in diagnostics.
    fn source_name(&self) -> &'static str;
}
