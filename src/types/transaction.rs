//! Structured form of a decoded transaction.

use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

/// Message header: how many of the leading account keys sign, and how many
/// of the signed/unsigned keys are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// Wire version of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    Legacy,
    V0,
}

/// A compiled instruction. Indices point into the message's account table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    /// Program-specific payload, never interpreted here.
    pub data: Vec<u8>,
}

/// Reference to an on-chain address lookup table (v0 messages only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

impl AddressTableLookup {
    /// Number of addresses this lookup contributes to the account table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writable_indexes.len() + self.readonly_indexes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: MessageVersion,
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<Instruction>,
    pub address_table_lookups: Vec<AddressTableLookup>,
}

impl Message {
    /// Number of accounts instructions may reference: static keys plus every
    /// address pulled in through lookup tables.
    #[must_use]
    pub fn addressable_accounts(&self) -> usize {
        self.account_keys.len()
            + self
                .address_table_lookups
                .iter()
                .map(AddressTableLookup::len)
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

/// An instruction whose indices have been replaced by public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstruction {
    pub program_id: Pubkey,
    /// Referenced accounts in instruction order. For transfers, position 0 is
    /// the source and position 1 the destination.
    pub accounts: Vec<Pubkey>,
}
