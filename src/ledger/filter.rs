//! Address filtering and pagination over a block's transaction list.

use std::num::IntErrorKind;

use crate::address::normalize_address;
use crate::ledger::types::{Direction, Transaction};

/// Whether `tx` involves `normalized` as sender or recipient.
/// Contract creations can only match on the sender.
pub fn involves(tx: &Transaction, normalized: &str) -> bool {
    normalize_address(&tx.from) == normalized
        || tx
            .to
            .as_deref()
            .is_some_and(|to| normalize_address(to) == normalized)
}

/// First `limit` transactions matching `address`, in block order.
///
/// Without an address every transaction matches. Nothing is reordered or
/// deduplicated.
pub fn filter_transactions(
    transactions: &[Transaction],
    address: Option<&str>,
    limit: usize,
) -> Vec<Transaction> {
    let wanted = address.map(normalize_address);
    transactions
        .iter()
        .filter(|tx| match &wanted {
            Some(addr) => involves(tx, addr),
            None => true,
        })
        .take(limit)
        .cloned()
        .collect()
}

/// `Outgoing` when the sender is `normalized`; a self-transfer is outgoing.
pub fn direction_for(tx: &Transaction, normalized: &str) -> Direction {
    if normalize_address(&tx.from) == normalized {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

/// Resolves a raw `limit` query value to `[1, max]`; missing or unparseable
/// values fall back to `default`. Integers too large for `i64` clamp like any
/// other out-of-range value.
pub fn clamp_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    let Some(raw) = raw.map(str::trim) else {
        return default.clamp(1, max);
    };
    match raw.parse::<i64>() {
        Ok(requested) => requested.clamp(1, max as i64) as usize,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => max,
            IntErrorKind::NegOverflow => 1,
            _ => default.clamp(1, max),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    const A: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const C: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    fn tx(n: u8, from: &str, to: Option<&str>) -> Transaction {
        Transaction {
            hash: format!("0x{}", format!("{:02x}", n).repeat(32)),
            from: from.to_string(),
            to: to.map(str::to_string),
            value_wei: U256::from(n as u64),
            gas_price: U256::ZERO,
            gas_limit: U256::from(21_000u64),
            nonce: n as u64,
            data: Vec::new(),
            block_number: Some(1),
        }
    }

    #[test]
    fn test_both_directions_kept_in_order() {
        let txs = vec![tx(1, A, Some(B)), tx(2, B, Some(A))];
        let picked = filter_transactions(&txs, Some(A), 10);
        assert_eq!(picked, txs);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let txs = vec![tx(1, C, Some(B)), tx(2, A, Some(C)), tx(3, B, Some(C))];
        let picked = filter_transactions(&txs, Some(&A.to_lowercase()), 10);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].nonce, 2);
    }

    #[test]
    fn test_contract_creation_matches_only_sender() {
        let txs = vec![tx(1, B, None), tx(2, A, None)];
        let picked = filter_transactions(&txs, Some(A), 10);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].nonce, 2);
        assert!(filter_transactions(&txs, Some(C), 10).is_empty());
    }

    #[test]
    fn test_limit_truncates_prefix() {
        let txs: Vec<_> = (0..20).map(|n| tx(n, A, Some(B))).collect();
        let picked = filter_transactions(&txs, None, 5);
        assert_eq!(picked.len(), 5);
        assert_eq!(
            picked.iter().map(|t| t.nonce).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_deterministic_and_no_dedup() {
        let duplicate = tx(1, A, Some(B));
        let txs = vec![duplicate.clone(), tx(2, C, Some(B)), duplicate];
        let first = filter_transactions(&txs, Some(A), 10);
        let second = filter_transactions(&txs, Some(A), 10);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_self_transfer_is_outgoing() {
        let own = normalize_address(A);
        assert_eq!(direction_for(&tx(1, A, Some(A)), &own), Direction::Outgoing);
        assert_eq!(direction_for(&tx(2, B, Some(A)), &own), Direction::Incoming);
        assert_eq!(direction_for(&tx(3, A, None), &own), Direction::Outgoing);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 10, 50), 10);
        assert_eq!(clamp_limit(Some("25"), 10, 50), 25);
        assert_eq!(clamp_limit(Some("0"), 10, 50), 1);
        assert_eq!(clamp_limit(Some("-4"), 10, 50), 1);
        assert_eq!(clamp_limit(Some("500"), 10, 50), 50);
        assert_eq!(clamp_limit(Some("abc"), 10, 50), 10);
    }

    #[test]
    fn test_clamp_limit_beyond_i64() {
        assert_eq!(clamp_limit(Some("99999999999999999999"), 10, 50), 50);
        assert_eq!(clamp_limit(Some("-99999999999999999999"), 10, 50), 1);
        assert_eq!(clamp_limit(Some("+99999999999999999999"), 10, 50), 50);
    }
}
