//! Fetched transaction records and the balance metadata that comes with them.

/// Raw transaction bytes plus the balance snapshots reported alongside them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransactionRecord {
    /// The transaction signature as reported by the notification.
    pub signature: String,
    /// The slot number where the transaction was confirmed.
    pub slot: u64,
    /// Serialized transaction in the chain's wire format.
    pub bytes: Vec<u8>,
    /// Lamport balances before the transaction, indexed like the account table.
    pub pre_balances: Vec<u64>,
    /// Lamport balances after the transaction.
    pub post_balances: Vec<u64>,
    /// Token balances before the transaction.
    pub pre_token_balances: Vec<TokenBalanceEntry>,
    /// Token balances after the transaction.
    pub post_token_balances: Vec<TokenBalanceEntry>,
    /// Addresses loaded through lookup tables (v0 transactions only).
    pub loaded_addresses: LoadedAddresses,
}

/// One token account touched by a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBalanceEntry {
    /// Index of the token account in the transaction's account table.
    pub account_index: u8,
    pub mint: String,
    /// Owner of the token account, empty when the node did not report one.
    pub owner: String,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiTokenAmount {
    /// Raw amount in base units, as a decimal string.
    pub amount: String,
    /// Fixed precision of the mint.
    pub decimals: u8,
    pub ui_amount_string: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAddresses {
    pub writable: Vec<solana_sdk::pubkey::Pubkey>,
    pub readonly: Vec<solana_sdk::pubkey::Pubkey>,
}
