use alloy_primitives::U256;
use serde_json::json;
use tracing::warn;

use crate::address::{is_address, is_tx_hash, normalize_address};
use crate::error::{FailureKind, RpcFailure};
use crate::ledger::filter::{direction_for, filter_transactions};
use crate::ledger::types::{
    parse_quantity_u64, Block, RawBlock, RawReceipt, RawTransaction, Transaction,
    TransactionDetails, TransactionReceipt, WalletSnapshot, WalletTransaction,
};
use crate::rpc::RpcClient;
use crate::units::parse_wei;

/// How a sub-fetch failure affects the operation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRole {
    /// The operation fails with the fetch.
    Primary,
    /// The failure is logged and replaced with a default.
    Auxiliary,
}

impl FetchRole {
    /// Applies the role to a fetch result. `Auxiliary` never returns `Err`.
    pub fn resolve<T>(
        self,
        what: &'static str,
        result: Result<T, RpcFailure>,
        default: T,
    ) -> Result<T, RpcFailure> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (FetchRole::Primary, Err(failure)) => Err(failure),
            (FetchRole::Auxiliary, Err(failure)) => {
                warn!(fetch = what, kind = %failure.kind, error = %failure.message, "ledger.degraded");
                Ok(default)
            }
        }
    }
}

fn malformed(what: &str, err: impl std::fmt::Display) -> RpcFailure {
    RpcFailure::new(FailureKind::Unknown, format!("malformed {}: {}", what, err), 0)
}

/// Read-only queries against the ledger, composed from [`RpcClient`] calls.
#[derive(Clone)]
pub struct LedgerService {
    client: RpcClient,
}

impl LedgerService {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Latest block including full transaction objects.
    pub async fn latest_block_with_transactions(&self) -> Result<Block, RpcFailure> {
        let raw: Option<RawBlock> = self
            .client
            .call("eth_getBlockByNumber", json!(["latest", true]))
            .await?;

        let raw = raw.ok_or_else(|| {
            RpcFailure::new(
                FailureKind::EmptyResult,
                "node returned no block for latest",
                0,
            )
        })?;
        Block::try_from(raw).map_err(|e| malformed("block", e))
    }

    /// Transaction by hash, merged with its receipt and confirmation depth.
    ///
    /// The transaction lookup is primary. The receipt and chain head lookups
    /// are auxiliary: on failure the receipt is absent and confirmations are 0.
    pub async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionDetails, RpcFailure> {
        if !is_tx_hash(hash) {
            return Err(RpcFailure::invalid_input("Invalid transaction hash"));
        }

        let raw: Option<RawTransaction> = FetchRole::Primary.resolve(
            "transaction",
            self.client
                .call("eth_getTransactionByHash", json!([hash]))
                .await,
            None,
        )?;
        let raw = raw.ok_or_else(|| RpcFailure::not_found("Transaction not found"))?;
        let transaction = Transaction::try_from(raw).map_err(|e| malformed("transaction", e))?;

        let (receipt, head) = tokio::join!(self.fetch_receipt(hash), self.fetch_head());
        let receipt = FetchRole::Auxiliary.resolve("receipt", receipt, None)?;
        let head = FetchRole::Auxiliary.resolve("block_number", head, None)?;

        let confirmations = match (transaction.block_number, head) {
            (Some(mined), Some(head)) if head >= mined => head - mined + 1,
            _ => 0,
        };

        Ok(TransactionDetails {
            transaction,
            receipt,
            confirmations,
        })
    }

    async fn fetch_receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, RpcFailure> {
        let raw: Option<RawReceipt> = self
            .client
            .call("eth_getTransactionReceipt", json!([hash]))
            .await?;
        raw.map(TransactionReceipt::try_from)
            .transpose()
            .map_err(|e| malformed("receipt", e))
    }

    async fn fetch_head(&self) -> Result<Option<u64>, RpcFailure> {
        let raw: String = self.client.call("eth_blockNumber", json!([])).await?;
        parse_quantity_u64(&raw)
            .map(Some)
            .map_err(|e| malformed("block number", e))
    }

    async fn fetch_balance(&self, address: &str) -> Result<U256, RpcFailure> {
        let raw: String = self
            .client
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_wei(&raw).map_err(|e| malformed("balance", e))
    }

    async fn fetch_is_contract(&self, address: &str) -> Result<bool, RpcFailure> {
        let code: String = self
            .client
            .call("eth_getCode", json!([address, "latest"]))
            .await?;
        let body = code.strip_prefix("0x").unwrap_or(&code);
        Ok(!body.is_empty() && body.chars().any(|c| c != '0'))
    }

    /// Balance, contract flag and the address's transactions in the latest block.
    ///
    /// Balance and contract lookups are auxiliary; the block lookup is primary.
    pub async fn wallet_snapshot(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<WalletSnapshot, RpcFailure> {
        if !is_address(address) {
            return Err(RpcFailure::invalid_input("Invalid wallet address"));
        }
        let address = normalize_address(address);

        let (balance, is_contract, block) = tokio::join!(
            self.fetch_balance(&address),
            self.fetch_is_contract(&address),
            self.latest_block_with_transactions(),
        );
        let balance_wei = FetchRole::Auxiliary.resolve("balance", balance, U256::ZERO)?;
        let is_contract = FetchRole::Auxiliary.resolve("code", is_contract, false)?;
        let block = FetchRole::Primary.resolve("latest_block", block, Block::default())?;

        let recent_transactions = filter_transactions(&block.transactions, Some(&address), limit)
            .into_iter()
            .map(|tx| WalletTransaction {
                direction: direction_for(&tx, &address),
                transaction: tx,
                timestamp: block.timestamp,
            })
            .collect();

        Ok(WalletSnapshot {
            address,
            balance_wei,
            is_contract,
            recent_transactions,
        })
    }
}
