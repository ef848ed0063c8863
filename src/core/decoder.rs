//! Wire decoder for serialized Solana transactions.
//!
//! Layout of a transaction:
//!
//! ```text
//! compact-u16 signature count | 64-byte signatures
//! [version prefix, v0 only: 0x80 | version]
//! header (3 bytes)
//! compact-u16 key count | 32-byte account keys
//! 32-byte recent blockhash
//! compact-u16 instruction count | instructions
//! [v0 only: compact-u16 lookup count | address table lookups]
//! ```
//!
//! An instruction is a `u8` program index, a compact-u16 prefixed list of `u8`
//! account indices and a compact-u16 prefixed data payload. The payload is
//! kept as opaque bytes.

use crate::types::transaction::{
    AddressTableLookup, Instruction, Message, MessageHeader, MessageVersion, Transaction,
};
use crate::utils::error::DecodeError;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

const SIGNATURE_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;
const HASH_LEN: usize = 32;
const VERSION_PREFIX_MASK: u8 = 0x80;

/// Decodes transactions from their wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    /// Creates a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decodes a serialized transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the buffer is truncated, carries a malformed
    /// length prefix or trailing bytes, has an inconsistent header, or if any
    /// instruction references an account the message cannot address.
    pub fn decode(&self, bytes: &[u8]) -> Result<Transaction, DecodeError> {
        decode_transaction(bytes)
    }
}

/// Decodes a serialized transaction. See [`Decoder::decode`].
///
/// # Errors
///
/// See [`Decoder::decode`].
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction, DecodeError> {
    let mut reader = Reader::new(bytes);

    let signature_count = reader.read_compact_u16()?;
    reader.ensure(signature_count * SIGNATURE_LEN)?;
    let mut signatures = Vec::with_capacity(signature_count);
    for _ in 0..signature_count {
        signatures.push(Signature::from(reader.read_array::<SIGNATURE_LEN>()?));
    }

    let message = read_message(&mut reader)?;

    if reader.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }

    if signatures.len() != usize::from(message.header.num_required_signatures) {
        return Err(DecodeError::InvalidHeader(format!(
            "{} signature(s) present but header requires {}",
            signatures.len(),
            message.header.num_required_signatures
        )));
    }

    validate_message(&message)?;

    Ok(Transaction {
        signatures,
        message,
    })
}

fn read_message(reader: &mut Reader<'_>) -> Result<Message, DecodeError> {
    let first = reader.peek_u8()?;
    let version = if first & VERSION_PREFIX_MASK == 0 {
        MessageVersion::Legacy
    } else {
        reader.read_u8()?;
        match first & !VERSION_PREFIX_MASK {
            0 => MessageVersion::V0,
            other => return Err(DecodeError::UnsupportedVersion(other)),
        }
    };

    let header = MessageHeader {
        num_required_signatures: reader.read_u8()?,
        num_readonly_signed_accounts: reader.read_u8()?,
        num_readonly_unsigned_accounts: reader.read_u8()?,
    };

    let key_count = reader.read_compact_u16()?;
    reader.ensure(key_count * PUBKEY_LEN)?;
    let mut account_keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        account_keys.push(reader.read_pubkey()?);
    }

    let recent_blockhash = Hash::new_from_array(reader.read_array::<HASH_LEN>()?);

    let instruction_count = reader.read_compact_u16()?;
    // Smallest instruction: program index plus two empty length prefixes.
    reader.ensure(instruction_count * 3)?;
    let mut instructions = Vec::with_capacity(instruction_count);
    for _ in 0..instruction_count {
        instructions.push(Instruction {
            program_id_index: reader.read_u8()?,
            account_indices: reader.read_compact_bytes()?.to_vec(),
            data: reader.read_compact_bytes()?.to_vec(),
        });
    }

    let mut address_table_lookups = Vec::new();
    if version == MessageVersion::V0 {
        let lookup_count = reader.read_compact_u16()?;
        reader.ensure(lookup_count * (PUBKEY_LEN + 2))?;
        address_table_lookups.reserve(lookup_count);
        for _ in 0..lookup_count {
            address_table_lookups.push(AddressTableLookup {
                account_key: reader.read_pubkey()?,
                writable_indexes: reader.read_compact_bytes()?.to_vec(),
                readonly_indexes: reader.read_compact_bytes()?.to_vec(),
            });
        }
    }

    Ok(Message {
        version,
        header,
        account_keys,
        recent_blockhash,
        instructions,
        address_table_lookups,
    })
}

fn validate_message(message: &Message) -> Result<(), DecodeError> {
    let header = &message.header;
    let key_count = message.account_keys.len();

    if usize::from(header.num_required_signatures)
        + usize::from(header.num_readonly_unsigned_accounts)
        > key_count
    {
        return Err(DecodeError::InvalidHeader(format!(
            "{} signer(s) and {} read-only unsigned account(s) exceed {key_count} account key(s)",
            header.num_required_signatures, header.num_readonly_unsigned_accounts
        )));
    }

    if header.num_readonly_signed_accounts >= header.num_required_signatures {
        return Err(DecodeError::InvalidHeader(format!(
            "{} read-only signer(s) leave no writable fee payer among {} signer(s)",
            header.num_readonly_signed_accounts, header.num_required_signatures
        )));
    }

    let account_count = message.addressable_accounts();
    for (position, instruction) in message.instructions.iter().enumerate() {
        let indices =
            std::iter::once(&instruction.program_id_index).chain(&instruction.account_indices);
        for &index in indices {
            if usize::from(index) >= account_count {
                return Err(DecodeError::IndexOutOfBounds {
                    instruction: position,
                    index,
                    account_count,
                });
            }
        }
    }

    Ok(())
}

/// Cursor over the input buffer that reports the failing offset.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Fails early when a length prefix claims more data than is left, so a
    /// corrupt prefix never drives a large allocation.
    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if needed > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
                needed: needed - self.remaining(),
            });
        }
        Ok(())
    }

    fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.bytes[self.offset])
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_slice(N)?);
        Ok(array)
    }

    fn read_pubkey(&mut self) -> Result<Pubkey, DecodeError> {
        Ok(Pubkey::new_from_array(self.read_array::<PUBKEY_LEN>()?))
    }

    fn read_compact_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_compact_u16()?;
        self.read_slice(len)
    }

    /// Reads a compact-u16: little-endian groups of 7 bits, high bit set on
    /// every byte but the last, at most 3 bytes. Overlong encodings and values
    /// above `u16::MAX` are rejected.
    fn read_compact_u16(&mut self) -> Result<usize, DecodeError> {
        let start = self.offset;
        let mut value: u32 = 0;
        for position in 0..3 {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7f) << (position * 7);
            if byte & 0x80 == 0 {
                if position > 0 && byte == 0 {
                    return Err(DecodeError::InvalidLength { offset: start });
                }
                return u16::try_from(value)
                    .map(usize::from)
                    .map_err(|_| DecodeError::InvalidLength { offset: start });
            }
        }
        Err(DecodeError::InvalidLength { offset: start })
    }
}
