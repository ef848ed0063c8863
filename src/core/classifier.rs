//! Maps a program id to the way its transfers are measured.

use solana_sdk::pubkey::Pubkey;

/// The native transfer program.
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::system_program::ID;

/// The fungible token program.
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// How an instruction's transfer amount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Lamport balances, reported in SOL.
    Native,
    /// Token balances, reported under the token owner's label.
    Token,
    /// Anything else; the instruction is ignored.
    Unknown,
}

/// Classifies a program id. Only the system and token programs are recognized.
#[must_use]
pub fn classify(program_id: &Pubkey) -> Strategy {
    if *program_id == SYSTEM_PROGRAM_ID {
        Strategy::Native
    } else if *program_id == TOKEN_PROGRAM_ID {
        Strategy::Token
    } else {
        Strategy::Unknown
    }
}
