//! Terminal artifact of the pipeline.

use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// What was moved.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    /// The chain's base currency.
    Native,
    /// A fungible token, labelled by the owner reported in the token balances.
    Token(String),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("SOL"),
            Self::Token(label) => f.write_str(label),
        }
    }
}

/// A transfer observed in a confirmed transaction.
///
/// Renders as `"<sender> has sent <amount> <asset> to <recipient>"` with the
/// amount printed to six decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub amount: f64,
    pub asset: Asset,
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has sent {:.6} {} to {}",
            self.sender, self.amount, self.asset, self.recipient
        )
    }
}
