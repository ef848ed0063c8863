//! Transaction fetch service.
//!
//! [`TransactionFetcher`] is the seam the monitor depends on; [`RpcFetcher`]
//! implements it with a JSON-RPC `getTransaction` call asking for the raw
//! base64 payload, so decoding stays in this crate.

use crate::types::metadata::{LoadedAddresses, RawTransactionRecord, TokenBalanceEntry, UiTokenAmount};
use crate::utils::error::{Result, SolTrackError};
use async_trait::async_trait;
use base64::Engine;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, TransactionBinaryEncoding,
    UiLoadedAddresses, UiTransactionEncoding, UiTransactionTokenBalance,
};
use std::str::FromStr;

/// Source of full transaction records.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    /// Fetches the record for `signature`.
    async fn fetch(&self, signature: &Signature) -> Result<RawTransactionRecord>;
}

/// Fetches transactions from a JSON-RPC node.
pub struct RpcFetcher {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcFetcher {
    /// Creates a fetcher for `rpc_url`.
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment),
            commitment,
        }
    }

    #[must_use]
    pub fn rpc_url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl TransactionFetcher for RpcFetcher {
    async fn fetch(&self, signature: &Signature) -> Result<RawTransactionRecord> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        let transaction = self
            .client
            .get_transaction_with_config(signature, config)
            .await
            .map_err(|e| SolTrackError::RpcError(format!("getTransaction {signature}: {e}")))?;

        record_from_encoded(signature, transaction)
    }
}

/// Converts an RPC response into a [`RawTransactionRecord`].
///
/// # Errors
///
/// Returns [`SolTrackError::RpcError`] if the response has no status
/// metadata, carries the transaction in a non-binary encoding, or contains
/// undecodable payloads or addresses.
pub fn record_from_encoded(
    signature: &Signature,
    transaction: EncodedConfirmedTransactionWithStatusMeta,
) -> Result<RawTransactionRecord> {
    let bytes = binary_payload(&transaction.transaction.transaction)?;

    let meta = transaction
        .transaction
        .meta
        .ok_or_else(|| SolTrackError::RpcError(format!("{signature}: missing transaction metadata")))?;

    let pre_token_balances: Option<Vec<UiTransactionTokenBalance>> = meta.pre_token_balances.into();
    let post_token_balances: Option<Vec<UiTransactionTokenBalance>> =
        meta.post_token_balances.into();
    let loaded_addresses: Option<UiLoadedAddresses> = meta.loaded_addresses.into();

    Ok(RawTransactionRecord {
        signature: signature.to_string(),
        slot: transaction.slot,
        bytes,
        pre_balances: meta.pre_balances,
        post_balances: meta.post_balances,
        pre_token_balances: pre_token_balances
            .unwrap_or_default()
            .into_iter()
            .map(token_balance_entry)
            .collect(),
        post_token_balances: post_token_balances
            .unwrap_or_default()
            .into_iter()
            .map(token_balance_entry)
            .collect(),
        loaded_addresses: loaded_addresses
            .map(parse_loaded_addresses)
            .transpose()?
            .unwrap_or_default(),
    })
}

fn binary_payload(transaction: &EncodedTransaction) -> Result<Vec<u8>> {
    match transaction {
        EncodedTransaction::Binary(data, TransactionBinaryEncoding::Base64) => {
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| SolTrackError::RpcError(format!("invalid base64 transaction: {e}")))
        }
        EncodedTransaction::Binary(data, TransactionBinaryEncoding::Base58)
        | EncodedTransaction::LegacyBinary(data) => bs58::decode(data)
            .into_vec()
            .map_err(|e| SolTrackError::RpcError(format!("invalid base58 transaction: {e}"))),
        EncodedTransaction::Json(_) | EncodedTransaction::Accounts(_) => Err(
            SolTrackError::RpcError("expected a binary-encoded transaction".to_string()),
        ),
    }
}

fn token_balance_entry(balance: UiTransactionTokenBalance) -> TokenBalanceEntry {
    TokenBalanceEntry {
        account_index: balance.account_index,
        mint: balance.mint,
        owner: Into::<Option<String>>::into(balance.owner).unwrap_or_default(),
        ui_token_amount: UiTokenAmount {
            amount: balance.ui_token_amount.amount,
            decimals: balance.ui_token_amount.decimals,
            ui_amount_string: balance.ui_token_amount.ui_amount_string,
        },
    }
}

fn parse_loaded_addresses(addresses: UiLoadedAddresses) -> Result<LoadedAddresses> {
    let parse = |keys: Vec<String>| {
        keys.iter()
            .map(|key| {
                Pubkey::from_str(key).map_err(|e| {
                    SolTrackError::RpcError(format!("invalid loaded address {key}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()
    };

    Ok(LoadedAddresses {
        writable: parse(addresses.writable)?,
        readonly: parse(addresses.readonly)?,
    })
}
