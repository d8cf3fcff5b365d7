//! Ledger data as returned by the node (`Raw*`) and in validated form.

use alloy_primitives::U256;
use serde::Deserialize;

use crate::units::{parse_wei, UnitError};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub number: Option<String>,
    pub hash: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub gas_price: Option<String>,
    pub gas: String,
    pub nonce: String,
    pub input: Option<String>,
    pub block_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    pub gas_used: String,
    pub status: Option<String>,
}

// ============================================================================
// Domain types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: Option<String>,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation.
    pub to: Option<String>,
    pub value_wei: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub nonce: u64,
    pub data: Vec<u8>,
    /// `None` while pending.
    pub block_number: Option<u64>,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Failed,
    /// Pre-Byzantium receipts carry no status.
    Unknown,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Success => "success",
            ReceiptStatus::Failed => "failed",
            ReceiptStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub gas_used: U256,
    pub status: ReceiptStatus,
}

/// A transaction merged with its best-effort receipt and depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    /// `None` when the receipt lookup failed or the transaction is pending.
    pub receipt: Option<TransactionReceipt>,
    pub confirmations: u64,
}

impl TransactionDetails {
    pub fn gas_used(&self) -> U256 {
        self.receipt.map(|r| r.gas_used).unwrap_or(U256::ZERO)
    }

    pub fn status(&self) -> ReceiptStatus {
        self.receipt
            .map(|r| r.status)
            .unwrap_or(ReceiptStatus::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTransaction {
    pub transaction: Transaction,
    pub direction: Direction,
    /// Timestamp of the block the transaction was read from.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    /// Normalized (lowercase) address.
    pub address: String,
    pub balance_wei: U256,
    pub is_contract: bool,
    pub recent_transactions: Vec<WalletTransaction>,
}

// ============================================================================
// Conversion
// ============================================================================

/// Parses a hex quantity (`"0x1b4"`) into a `u64`.
pub fn parse_quantity_u64(raw: &str) -> Result<u64, UnitError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| UnitError::InvalidNumber(raw.to_string()))?;
    if digits.is_empty() {
        return Err(UnitError::InvalidNumber(raw.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| UnitError::InvalidNumber(raw.to_string()))
}

fn parse_data(raw: Option<&str>) -> Result<Vec<u8>, UnitError> {
    let body = match raw {
        None => return Ok(Vec::new()),
        Some(s) => s.strip_prefix("0x").unwrap_or(s),
    };
    hex::decode(body).map_err(|e| UnitError::InvalidNumber(format!("input data: {}", e)))
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = UnitError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        Ok(Transaction {
            value_wei: parse_wei(&raw.value)?,
            gas_price: match raw.gas_price.as_deref() {
                Some(price) => parse_wei(price)?,
                None => U256::ZERO,
            },
            gas_limit: parse_wei(&raw.gas)?,
            nonce: parse_quantity_u64(&raw.nonce)?,
            data: parse_data(raw.input.as_deref())?,
            block_number: raw
                .block_number
                .as_deref()
                .map(parse_quantity_u64)
                .transpose()?,
            hash: raw.hash,
            from: raw.from,
            to: raw.to.filter(|t| !t.is_empty()),
        })
    }
}

impl TryFrom<RawBlock> for Block {
    type Error = UnitError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let number = raw
            .number
            .as_deref()
            .ok_or_else(|| UnitError::InvalidNumber("block has no number".to_string()))
            .and_then(parse_quantity_u64)?;

        Ok(Block {
            number,
            hash: raw.hash,
            timestamp: parse_quantity_u64(&raw.timestamp)?,
            transactions: raw
                .transactions
                .into_iter()
                .map(Transaction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<RawReceipt> for TransactionReceipt {
    type Error = UnitError;

    fn try_from(raw: RawReceipt) -> Result<Self, Self::Error> {
        let status = match raw.status.as_deref() {
            None => ReceiptStatus::Unknown,
            Some(s) => match parse_quantity_u64(s)? {
                1 => ReceiptStatus::Success,
                _ => ReceiptStatus::Failed,
            },
        };
        Ok(TransactionReceipt {
            gas_used: parse_wei(&raw.gas_used)?,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_tx() -> serde_json::Value {
        json!({
            "hash": format!("0x{}", "11".repeat(32)),
            "from": "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "to": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "value": "0xde0b6b3a7640000",
            "gasPrice": "0x9502f900",
            "gas": "0x5208",
            "nonce": "0x7",
            "input": "0xa9059cbb",
            "blockNumber": "0x10"
        })
    }

    #[test]
    fn test_transaction_conversion() {
        let raw: RawTransaction = serde_json::from_value(raw_tx()).unwrap();
        let tx = Transaction::try_from(raw).unwrap();

        assert_eq!(tx.value_wei, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(tx.gas_price, U256::from(2_500_000_000u64));
        assert_eq!(tx.gas_limit, U256::from(21_000u64));
        assert_eq!(tx.nonce, 7);
        assert_eq!(tx.data, vec![0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(tx.block_number, Some(16));
        assert!(!tx.is_contract_creation());
    }

    #[test]
    fn test_contract_creation_and_pending() {
        let mut value = raw_tx();
        value["to"] = serde_json::Value::Null;
        value["blockNumber"] = serde_json::Value::Null;
        value.as_object_mut().unwrap().remove("gasPrice");

        let raw: RawTransaction = serde_json::from_value(value).unwrap();
        let tx = Transaction::try_from(raw).unwrap();
        assert!(tx.is_contract_creation());
        assert_eq!(tx.block_number, None);
        assert_eq!(tx.gas_price, U256::ZERO);
    }

    #[test]
    fn test_malformed_quantity_rejected() {
        let mut value = raw_tx();
        value["nonce"] = json!("seven");
        let raw: RawTransaction = serde_json::from_value(value).unwrap();
        assert!(Transaction::try_from(raw).is_err());
    }

    #[test]
    fn test_block_conversion_keeps_order() {
        let mut second = raw_tx();
        second["hash"] = json!(format!("0x{}", "22".repeat(32)));
        let raw: RawBlock = serde_json::from_value(json!({
            "number": "0x1b4",
            "hash": format!("0x{}", "ff".repeat(32)),
            "timestamp": "0x6553f100",
            "transactions": [raw_tx(), second]
        }))
        .unwrap();

        let block = Block::try_from(raw).unwrap();
        assert_eq!(block.number, 436);
        assert_eq!(block.timestamp, 0x6553f100);
        assert_eq!(block.transactions.len(), 2);
        assert!(block.transactions[1].hash.starts_with("0x22"));
    }

    #[test]
    fn test_receipt_status() {
        let ok: RawReceipt =
            serde_json::from_value(json!({"gasUsed": "0x5208", "status": "0x1"})).unwrap();
        let receipt = TransactionReceipt::try_from(ok).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(receipt.gas_used, U256::from(21_000u64));

        let failed: RawReceipt =
            serde_json::from_value(json!({"gasUsed": "0x0", "status": "0x0"})).unwrap();
        assert_eq!(
            TransactionReceipt::try_from(failed).unwrap().status,
            ReceiptStatus::Failed
        );

        let legacy: RawReceipt = serde_json::from_value(json!({"gasUsed": "0x1"})).unwrap();
        assert_eq!(
            TransactionReceipt::try_from(legacy).unwrap().status,
            ReceiptStatus::Unknown
        );
    }

    #[test]
    fn test_details_defaults_without_receipt() {
        let raw: RawTransaction = serde_json::from_value(raw_tx()).unwrap();
        let details = TransactionDetails {
            transaction: Transaction::try_from(raw).unwrap(),
            receipt: None,
            confirmations: 0,
        };
        assert_eq!(details.gas_used(), U256::ZERO);
        assert_eq!(details.status(), ReceiptStatus::Unknown);
    }
}
