//! Resolves instruction indices against a message's account table.

use crate::types::metadata::LoadedAddresses;
use crate::types::transaction::{Instruction, Message, ResolvedInstruction};
use crate::utils::error::ResolveError;
use solana_sdk::pubkey::Pubkey;

/// The full account table of a message: static keys followed by the writable
/// and then the read-only addresses loaded through lookup tables.
#[derive(Debug, Clone, Copy)]
pub struct AccountTable<'a> {
    static_keys: &'a [Pubkey],
    loaded: &'a LoadedAddresses,
}

impl<'a> AccountTable<'a> {
    #[must_use]
    pub fn new(message: &'a Message, loaded: &'a LoadedAddresses) -> Self {
        Self {
            static_keys: &message.account_keys,
            loaded,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.static_keys.len() + self.loaded.writable.len() + self.loaded.readonly.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a single index.
    #[must_use]
    pub fn get(&self, index: u8) -> Option<&'a Pubkey> {
        let index = usize::from(index);
        let writable_end = self.static_keys.len() + self.loaded.writable.len();
        if index < self.static_keys.len() {
            self.static_keys.get(index)
        } else if index < writable_end {
            self.loaded.writable.get(index - self.static_keys.len())
        } else {
            self.loaded.readonly.get(index - writable_end)
        }
    }

    fn lookup(&self, index: u8) -> Result<Pubkey, ResolveError> {
        self.get(index)
            .copied()
            .ok_or_else(|| ResolveError::IndexOutOfRange {
                index,
                account_count: self.len(),
            })
    }

    /// Resolves the program and every referenced account of `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::IndexOutOfRange`] if any index is past the end
    /// of the table.
    pub fn resolve(&self, instruction: &Instruction) -> Result<ResolvedInstruction, ResolveError> {
        let program_id = self.lookup(instruction.program_id_index)?;
        let accounts = instruction
            .account_indices
            .iter()
            .map(|&index| self.lookup(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedInstruction {
            program_id,
            accounts,
        })
    }
}

/// Resolves `instruction` against the static account keys of `message`.
///
/// # Errors
///
/// Returns [`ResolveError::IndexOutOfRange`] if any index exceeds
/// `message.account_keys.len() - 1`.
pub fn resolve(
    instruction: &Instruction,
    message: &Message,
) -> Result<ResolvedInstruction, ResolveError> {
    AccountTable::new(message, &LoadedAddresses::default()).resolve(instruction)
}

impl ResolvedInstruction {
    /// Source and destination of a transfer-shaped instruction.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingTransferAccounts`] when fewer than two
    /// accounts are referenced.
    pub fn transfer_parties(&self) -> Result<(Pubkey, Pubkey), ResolveError> {
        match self.accounts.as_slice() {
            [sender, recipient, ..] => Ok((*sender, *recipient)),
            _ => Err(ResolveError::MissingTransferAccounts {
                found: self.accounts.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::{MessageHeader, MessageVersion};
    use solana_sdk::hash::Hash;

    fn message_with_keys(account_keys: Vec<Pubkey>) -> Message {
        Message {
            version: MessageVersion::Legacy,
            header: MessageHeader::default(),
            account_keys,
            recent_blockhash: Hash::default(),
            instructions: vec![],
            address_table_lookups: vec![],
        }
    }

    fn instruction(program_id_index: u8, account_indices: Vec<u8>) -> Instruction {
        Instruction {
            program_id_index,
            account_indices,
            data: vec![],
        }
    }

    #[test]
    fn test_resolve_in_range() {
        let keys: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
        let message = message_with_keys(keys.clone());

        let resolved = resolve(&instruction(2, vec![1, 0, 1]), &message).unwrap();

        assert_eq!(resolved.program_id, keys[2]);
        assert_eq!(resolved.accounts, vec![keys[1], keys[0], keys[1]]);
    }

    #[test]
    fn test_resolve_out_of_range_account() {
        let message = message_with_keys((0..3).map(|_| Pubkey::new_unique()).collect());

        let err = resolve(&instruction(0, vec![1, 5]), &message).unwrap_err();

        assert_eq!(
            err,
            ResolveError::IndexOutOfRange {
                index: 5,
                account_count: 3
            }
        );
    }

    #[test]
    fn test_resolve_out_of_range_program() {
        let message = message_with_keys(vec![Pubkey::new_unique()]);
        let err = resolve(&instruction(1, vec![0]), &message).unwrap_err();
        assert!(matches!(err, ResolveError::IndexOutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_resolve_length_matches_index_count() {
        let message = message_with_keys((0..4).map(|_| Pubkey::new_unique()).collect());
        for indices in [vec![], vec![0], vec![3, 2, 1, 0, 0]] {
            let count = indices.len();
            let resolved = resolve(&instruction(0, indices), &message).unwrap();
            assert_eq!(resolved.accounts.len(), count);
        }
    }

    #[test]
    fn test_resolve_through_loaded_addresses() {
        let static_keys: Vec<Pubkey> = (0..2).map(|_| Pubkey::new_unique()).collect();
        let message = message_with_keys(static_keys.clone());
        let loaded = LoadedAddresses {
            writable: vec![Pubkey::new_unique()],
            readonly: vec![Pubkey::new_unique()],
        };
        let table = AccountTable::new(&message, &loaded);

        assert_eq!(table.len(), 4);
        let resolved = table.resolve(&instruction(3, vec![0, 2])).unwrap();
        assert_eq!(resolved.program_id, loaded.readonly[0]);
        assert_eq!(resolved.accounts, vec![static_keys[0], loaded.writable[0]]);

        assert!(table.resolve(&instruction(0, vec![4])).is_err());
        // Without the loaded addresses the same index is unresolvable.
        assert!(resolve(&instruction(0, vec![2]), &message).is_err());
    }

    #[test]
    fn test_transfer_parties() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let resolved = ResolvedInstruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![a, b, Pubkey::new_unique()],
        };
        assert_eq!(resolved.transfer_parties().unwrap(), (a, b));

        let short = ResolvedInstruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![a],
        };
        assert_eq!(
            short.transfer_parties().unwrap_err(),
            ResolveError::MissingTransferAccounts { found: 1 }
        );
    }
}
