//! Transfer amounts from pre/post balance snapshots.
//!
//! Both calculators scan every position of the snapshots and report the
//! largest single increase. They do not know which position belongs to the
//! resolved recipient. The result is only exact when the transaction has a
//! single beneficiary and no other account (the fee payer included) gains
//! more than it; multi-recipient transactions report their largest credit.

use crate::types::metadata::TokenBalanceEntry;
use crate::utils::error::ShapeError;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Which token balance field the token calculator compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenDeltaStrategy {
    /// Compares the mints' `decimals` by position, reproducing the original
    /// monitor's output. This is a precision, not an amount.
    #[default]
    Decimals,
    /// Compares raw token amounts of the same token account, scaled by the
    /// mint's decimals.
    Amount,
}

/// Result of the token calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDelta {
    pub amount: f64,
    /// Label used as the asset name in the output line.
    pub label: String,
}

fn ensure_same_len(kind: &'static str, pre: usize, post: usize) -> Result<(), ShapeError> {
    if pre == post {
        Ok(())
    } else {
        Err(ShapeError { kind, pre, post })
    }
}

/// Largest per-account lamport increase, divided by `denomination`.
///
/// Returns `0.0` when no balance increased.
///
/// # Errors
///
/// Returns [`ShapeError`] when the snapshots differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn native_delta(pre: &[u64], post: &[u64], denomination: u64) -> Result<f64, ShapeError> {
    ensure_same_len("native", pre.len(), post.len())?;

    let max_increase = pre
        .iter()
        .zip(post)
        .map(|(before, after)| i128::from(*after) - i128::from(*before))
        .filter(|delta| *delta > 0)
        .max()
        .unwrap_or(0);

    Ok(max_increase as f64 / denomination.max(1) as f64)
}

/// Largest per-position token increase under `strategy`.
///
/// # Errors
///
/// With [`TokenDeltaStrategy::Decimals`] the snapshots are compared by
/// position and must have the same length, otherwise [`ShapeError`] is
/// returned. [`TokenDeltaStrategy::Amount`] matches entries by account index
/// and accepts token accounts that only appear after the transaction.
pub fn token_delta(
    pre: &[TokenBalanceEntry],
    post: &[TokenBalanceEntry],
    strategy: TokenDeltaStrategy,
) -> Result<TokenDelta, ShapeError> {
    let best = match strategy {
        TokenDeltaStrategy::Decimals => {
            ensure_same_len("token", pre.len(), post.len())?;
            pre.iter()
                .zip(post)
                .enumerate()
                .map(|(position, (before, after))| {
                    let delta = i32::from(after.ui_token_amount.decimals)
                        - i32::from(before.ui_token_amount.decimals);
                    (position, f64::from(delta))
                })
                .filter(|(_, delta)| *delta > 0.0)
                .fold(None, keep_largest)
        }
        TokenDeltaStrategy::Amount => post
            .iter()
            .enumerate()
            .map(|(position, after)| {
                let before = pre
                    .iter()
                    .find(|entry| entry.account_index == after.account_index)
                    .map_or(0, raw_amount);
                (position, scaled(raw_amount(after) - before, after.ui_token_amount.decimals))
            })
            .filter(|(_, delta)| *delta > 0.0)
            .fold(None, keep_largest),
    };

    let (amount, position) = best.map_or((0.0, None), |(position, amount)| {
        (amount, Some(position))
    });

    Ok(TokenDelta {
        amount,
        label: token_label(post, position),
    })
}

// Ties keep the earliest position.
fn keep_largest(best: Option<(usize, f64)>, candidate: (usize, f64)) -> Option<(usize, f64)> {
    match best {
        Some(current) if current.1 >= candidate.1 => Some(current),
        _ => Some(candidate),
    }
}

fn raw_amount(entry: &TokenBalanceEntry) -> i128 {
    entry.ui_token_amount.amount.parse::<i128>().unwrap_or_else(|_| {
        log::debug!(
            "Unparsable token amount {:?} for account index {}",
            entry.ui_token_amount.amount,
            entry.account_index
        );
        0
    })
}

#[allow(clippy::cast_precision_loss)]
fn scaled(raw: i128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(i32::from(decimals))
}

/// Owner of the entry that produced the maximum, then the first reported
/// owner, then the mint.
fn token_label(post: &[TokenBalanceEntry], position: Option<usize>) -> String {
    let preferred = position.and_then(|p| post.get(p));
    preferred
        .into_iter()
        .chain(post)
        .map(|entry| entry.owner.as_str())
        .find(|owner| !owner.is_empty())
        .or_else(|| {
            preferred
                .into_iter()
                .chain(post)
                .map(|entry| entry.mint.as_str())
                .find(|mint| !mint.is_empty())
        })
        .unwrap_or("token")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::metadata::UiTokenAmount;

    fn entry(account_index: u8, owner: &str, amount: &str, decimals: u8) -> TokenBalanceEntry {
        TokenBalanceEntry {
            account_index,
            mint: "Mint1111".to_string(),
            owner: owner.to_string(),
            ui_token_amount: UiTokenAmount {
                amount: amount.to_string(),
                decimals,
                ui_amount_string: String::new(),
            },
        }
    }

    #[test]
    fn test_native_delta_max_increase() {
        let delta = native_delta(&[100, 50], &[80, 70], 1).unwrap();
        assert!((delta - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_native_delta_scaled_by_denomination() {
        let pre = [5 * LAMPORTS_PER_SOL, 0, 10];
        let post = [3 * LAMPORTS_PER_SOL - 5000, 2 * LAMPORTS_PER_SOL, 10];
        let delta = native_delta(&pre, &post, LAMPORTS_PER_SOL).unwrap();
        assert!((delta - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_native_delta_no_increase() {
        assert_eq!(native_delta(&[7, 8, 9], &[7, 8, 9], 1).unwrap(), 0.0);
        assert_eq!(native_delta(&[10], &[1], 1).unwrap(), 0.0);
        assert_eq!(native_delta(&[], &[], 1).unwrap(), 0.0);
    }

    #[test]
    fn test_native_delta_ignores_non_maximal_changes() {
        let base = native_delta(&[0, 0, 0], &[30, 5, 1], 1).unwrap();
        for smaller in [0, 10, 29] {
            let other = native_delta(&[0, 0, 0], &[30, smaller, 1], 1).unwrap();
            assert_eq!(base, other);
        }
        // Swapping positions of other accounts does not matter either.
        assert_eq!(base, native_delta(&[0, 0, 0], &[1, 5, 30], 1).unwrap());
    }

    #[test]
    fn test_native_delta_extreme_values() {
        let delta = native_delta(&[0, u64::MAX], &[u64::MAX, 0], 1).unwrap();
        assert!(delta > 0.0);
    }

    #[test]
    fn test_native_delta_shape_error() {
        assert_eq!(
            native_delta(&[1, 2], &[1], 1).unwrap_err(),
            ShapeError {
                kind: "native",
                pre: 2,
                post: 1
            }
        );
    }

    #[test]
    fn test_token_delta_decimals() {
        let pre = [entry(1, "OwnerA", "100", 6), entry(2, "OwnerB", "0", 2)];
        let post = [entry(1, "OwnerA", "40", 6), entry(2, "OwnerB", "60", 9)];

        let delta = token_delta(&pre, &post, TokenDeltaStrategy::Decimals).unwrap();

        assert_eq!(delta.amount, 7.0);
        assert_eq!(delta.label, "OwnerB");
    }

    #[test]
    fn test_token_delta_decimals_unchanged_is_zero() {
        let pre = [entry(1, "OwnerA", "100", 6), entry(2, "OwnerB", "0", 6)];
        let post = [entry(1, "OwnerA", "40", 6), entry(2, "OwnerB", "60", 6)];

        let delta = token_delta(&pre, &post, TokenDeltaStrategy::Decimals).unwrap();

        assert_eq!(delta.amount, 0.0);
        // Falls back to the first reported owner.
        assert_eq!(delta.label, "OwnerA");
    }

    #[test]
    fn test_token_delta_decimals_shape_error() {
        let pre = [entry(1, "OwnerA", "100", 6)];
        let err = token_delta(&pre, &[], TokenDeltaStrategy::Decimals).unwrap_err();
        assert_eq!(err.kind, "token");
    }

    #[test]
    fn test_token_delta_amount() {
        let pre = [entry(1, "OwnerA", "100000000", 6), entry(2, "OwnerB", "0", 6)];
        let post = [entry(1, "OwnerA", "40000000", 6), entry(2, "OwnerB", "60000000", 6)];

        let delta = token_delta(&pre, &post, TokenDeltaStrategy::Amount).unwrap();

        assert!((delta.amount - 60.0).abs() < 1e-9);
        assert_eq!(delta.label, "OwnerB");
    }

    #[test]
    fn test_token_delta_amount_new_token_account() {
        let pre = [entry(1, "OwnerA", "500", 2)];
        let post = [entry(1, "OwnerA", "250", 2), entry(4, "OwnerC", "250", 2)];

        let delta = token_delta(&pre, &post, TokenDeltaStrategy::Amount).unwrap();

        assert!((delta.amount - 2.5).abs() < 1e-9);
        assert_eq!(delta.label, "OwnerC");
    }

    #[test]
    fn test_token_label_falls_back_to_mint() {
        let post = [entry(1, "", "1", 0)];
        assert_eq!(token_label(&post, Some(0)), "Mint1111");
        assert_eq!(token_label(&[], None), "token");
    }
}
