//! Monitor loop.
//!
//! Takes one notification at a time through fetch, the [`Pipeline`] and the
//! [`Emitter`]. A failure while handling a notification drops that
//! notification and the loop carries on. Output failures and a broken
//! transport end the loop with an error. Whatever the exit path, the
//! notification source is closed before [`Monitor::run`] returns.

use crate::config::MonitorConfig;
use crate::core::emitter::Emitter;
use crate::core::fetcher::TransactionFetcher;
use crate::core::pipeline::Pipeline;
use crate::streams::{Notification, NotificationSource};
use crate::utils::error::{Result, SolTrackError};
use crate::utils::logging;
use futures_util::FutureExt;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Counters kept across the lifetime of a monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Notifications taken from the source.
    pub received: u64,
    /// Transfer lines written.
    pub emitted: u64,
    /// Notifications dropped after a fetch, decode, resolve or shape failure.
    pub dropped: u64,
    /// Failed receives reported by the source.
    pub receive_errors: u64,
}

/// Drives the transaction-processing pipeline for one wallet.
pub struct Monitor<F, W>
where
    F: TransactionFetcher,
    W: Write,
{
    config: MonitorConfig,
    fetcher: F,
    pipeline: Pipeline,
    emitter: Emitter<W>,
    stats: MonitorStats,
    cancellation_token: CancellationToken,
}

impl<F, W> Monitor<F, W>
where
    F: TransactionFetcher,
    W: Write + Send,
{
    pub fn new(config: MonitorConfig, fetcher: F, emitter: Emitter<W>) -> Self {
        let pipeline = Pipeline::from_config(&config);
        Self {
            config,
            fetcher,
            pipeline,
            emitter,
            stats: MonitorStats::default(),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn emitter(&self) -> &Emitter<W> {
        &self.emitter
    }

    /// Token that stops [`Monitor::run`] when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Triggers a graceful shutdown programmatically.
    pub fn shutdown(&self) {
        self.cancellation_token.cancel();
    }

    /// Fetches and processes one notification, then writes its events.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns any fetch, timeout, decode, resolve or shape error (all
    /// recoverable), or [`SolTrackError::OutputError`] when writing fails.
    pub async fn handle_notification(&mut self, notification: &Notification) -> Result<usize> {
        let secs = self.config.fetch_timeout_secs;
        let record = tokio::time::timeout(
            Duration::from_secs(secs),
            self.fetcher.fetch(&notification.signature),
        )
        .await
        .map_err(|_| SolTrackError::FetchTimeout(secs))??;

        let events = self.pipeline.process(&record)?;
        if events.is_empty() {
            log::debug!(
                "{} (slot {}): no recognized transfer",
                record.signature,
                record.slot
            );
        }

        for event in &events {
            self.emitter.emit(event)?;
        }
        Ok(events.len())
    }

    /// Runs until the source closes, the token is cancelled, or output fails.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error, including the transport
    /// failure of a source that ended abnormally. The source is closed in
    /// every case.
    pub async fn run<S: NotificationSource>(&mut self, mut source: S) -> Result<()> {
        logging::log(
            logging::LogLevel::Info,
            &format!("Monitoring {} via {}", self.config.wallet, source.source_name()),
        );

        let outcome = self.drive(&mut source).await;
        source.close().await;

        let stats = self.stats;
        logging::log(
            logging::LogLevel::Info,
            &format!(
                "Monitor stopped: {} received, {} emitted, {} dropped, {} receive error(s)",
                stats.received, stats.emitted, stats.dropped, stats.receive_errors
            ),
        );
        outcome
    }

    async fn drive<S: NotificationSource>(&mut self, source: &mut S) -> Result<()> {
        loop {
            let next = tokio::select! {
                () = self.cancellation_token.cancelled() => {
                    logging::log(logging::LogLevel::Info, "Graceful shutdown initiated...");
                    return Ok(());
                }
                next = source.next_notification() => next,
            };

            let notification = match next {
                None => {
                    if let Some(failure) = source.take_failure() {
                        logging::log_error("Notification source failed", &failure.to_string());
                        return Err(failure);
                    }
                    logging::log(logging::LogLevel::Warning, "Notification source closed");
                    return Ok(());
                }
                Some(Err(e)) => {
                    self.stats.receive_errors += 1;
                    logging::log_error("Error receiving message", &e.to_string());
                    continue;
                }
                Some(Ok(notification)) => notification,
            };

            self.stats.received += 1;
            let signature = notification.signature;
            let slot = notification.slot;

            // A panic in any stage must not unwind past the loop.
            let outcome = AssertUnwindSafe(self.handle_notification(&notification))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(count)) => {
                    self.stats.emitted += count as u64;
                }
                Ok(Err(e)) if e.is_recoverable() => {
                    self.stats.dropped += 1;
                    logging::log_error(
                        "Transaction error",
                        &format!("{signature} (slot {slot}): {e}"),
                    );
                }
                Ok(Err(e)) => return Err(e),
                Err(panic) => {
                    self.stats.dropped += 1;
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    let err = SolTrackError::InternalError(format!("stage panicked: {reason}"));
                    logging::log_error(
                        "Transaction error",
                        &format!("{signature} (slot {slot}): {err}"),
                    );
                }
            }
        }
    }
}
