//! The pure part of transaction processing: decode, resolve, classify and
//! calculate. Running it twice on the same record yields the same events.

use crate::config::MonitorConfig;
use crate::core::balance::{TokenDeltaStrategy, native_delta, token_delta};
use crate::core::classifier::{Strategy, classify};
use crate::core::decoder::Decoder;
use crate::core::resolver::AccountTable;
use crate::types::events::{Asset, TransferEvent};
use crate::types::metadata::RawTransactionRecord;
use crate::utils::error::Result;

/// Turns a fetched record into transfer events.
#[derive(Debug, Clone)]
pub struct Pipeline {
    decoder: Decoder,
    denomination: u64,
    token_delta: TokenDeltaStrategy,
}

impl Pipeline {
    #[must_use]
    pub fn new(denomination: u64, token_delta: TokenDeltaStrategy) -> Self {
        Self {
            decoder: Decoder::new(),
            denomination,
            token_delta,
        }
    }

    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.denomination, config.token_delta)
    }

    /// Processes one record.
    ///
    /// Every instruction is resolved and classified in order. Instructions of
    /// unrecognized programs are skipped; system and token instructions each
    /// yield one event. The first failure aborts the whole record, so either
    /// all events of a transaction are returned or none.
    ///
    /// # Errors
    ///
    /// Returns the decode, resolve or shape error that stopped processing.
    pub fn process(&self, record: &RawTransactionRecord) -> Result<Vec<TransferEvent>> {
        let transaction = self.decoder.decode(&record.bytes)?;
        let accounts = AccountTable::new(&transaction.message, &record.loaded_addresses);

        let mut events = Vec::new();
        for instruction in &transaction.message.instructions {
            let resolved = accounts.resolve(instruction)?;

            let (amount, asset) = match classify(&resolved.program_id) {
                Strategy::Unknown => continue,
                Strategy::Native => (
                    native_delta(&record.pre_balances, &record.post_balances, self.denomination)?,
                    Asset::Native,
                ),
                Strategy::Token => {
                    let delta = token_delta(
                        &record.pre_token_balances,
                        &record.post_token_balances,
                        self.token_delta,
                    )?;
                    (delta.amount, Asset::Token(delta.label))
                }
            };

            let (sender, recipient) = resolved.transfer_parties()?;
            events.push(TransferEvent {
                sender,
                recipient,
                amount,
                asset,
            });
        }

        Ok(events)
    }
}
