//! Turns a mined receipt into the canonical state update for a transaction.

use crate::event_bus::EventBus;
use crate::tokens::TokenRegistry;
use crate::WatcherError;
use std::sync::Arc;
use watcher_rpc::RpcService;
use watcher_storage::TransactionStore;
use watcher_types::{
	format_token_amount, truncate_id, CanonicalReceiptUpdate, Fee, FeeType, NetworkId,
	ReceiptStatus, TokenAmount, TransactionReceipt, TransactionStatus, WatcherEvent,
};

/// Maps receipts to canonical status and fees and writes them to the store.
pub struct StatusReconciler {
	rpc: Arc<RpcService>,
	store: Arc<dyn TransactionStore>,
	tokens: Arc<TokenRegistry>,
	event_bus: EventBus,
}

impl StatusReconciler {
	pub fn new(
		rpc: Arc<RpcService>,
		store: Arc<dyn TransactionStore>,
		tokens: Arc<TokenRegistry>,
		event_bus: EventBus,
	) -> Self {
		Self {
			rpc,
			store,
			tokens,
			event_bus,
		}
	}

	/// Reconciles `receipt` into the record identified by `tx_id`.
	///
	/// `override_status` replaces the status derived from the receipt.
	/// Fee details are omitted when `fee_currency_id` is unset or unknown on
	/// `network_id`. Block lookup and store failures are returned to the caller.
	pub async fn reconcile(
		&self,
		tx_id: &str,
		receipt: &TransactionReceipt,
		network_id: NetworkId,
		fee_currency_id: Option<&str>,
		override_status: Option<TransactionStatus>,
	) -> Result<CanonicalReceiptUpdate, WatcherError> {
		let status = override_status.unwrap_or_else(|| receipt_status(receipt.status));
		let fees = self.security_fees(receipt, network_id, fee_currency_id);

		let block = self.rpc.get_block(network_id, receipt.block_number).await?;

		let update = CanonicalReceiptUpdate {
			tx_id: tx_id.to_string(),
			transaction_hash: receipt.hash.clone(),
			block: receipt.block_number.to_string(),
			status,
			fees,
			block_timestamp_in_ms: block.timestamp.saturating_mul(1000),
		};

		self.store.apply_receipt_update(&update).await?;

		tracing::info!(
			tx_id = %truncate_id(tx_id),
			tx_hash = %truncate_id(&receipt.hash.to_hex()),
			network_id = %network_id,
			status = ?update.status,
			block = %update.block,
			"Transaction reconciled"
		);

		self.event_bus
			.publish(WatcherEvent::ReceiptReconciled(update.clone()));

		Ok(update)
	}

	fn security_fees(
		&self,
		receipt: &TransactionReceipt,
		network_id: NetworkId,
		fee_currency_id: Option<&str>,
	) -> Vec<Fee> {
		let Some(fee_currency_id) = fee_currency_id else {
			return Vec::new();
		};

		let Some(token) = self.tokens.get(network_id, fee_currency_id) else {
			tracing::error!(
				tx_hash = %truncate_id(&receipt.hash.to_hex()),
				network_id = %network_id,
				fee_currency_id = %fee_currency_id,
				"No token info found for fee currency, omitting fees"
			);
			return Vec::new();
		};

		let Some(fee) = receipt.gas_used.checked_mul(receipt.effective_gas_price) else {
			tracing::error!(
				tx_hash = %truncate_id(&receipt.hash.to_hex()),
				network_id = %network_id,
				gas_used = %receipt.gas_used,
				effective_gas_price = %receipt.effective_gas_price,
				"Gas fee overflows 256 bits, omitting fees"
			);
			return Vec::new();
		};

		vec![Fee {
			fee_type: FeeType::SecurityFee,
			amount: TokenAmount {
				value: format_token_amount(&fee.to_string(), token.fee_decimals()),
				token_id: token.token_id.clone(),
			},
		}]
	}
}

/// Status implied by a receipt alone.
pub fn receipt_status(status: ReceiptStatus) -> TransactionStatus {
	match status {
		ReceiptStatus::Success => TransactionStatus::Complete,
		ReceiptStatus::Reverted | ReceiptStatus::Absent => TransactionStatus::Failed,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use crate::test_support::{receipt, store_with, standby, FakeChain};
	use watcher_types::{TokenInfo, TransactionKind};

	fn registry() -> Arc<TokenRegistry> {
		Arc::new(TokenRegistry::new(vec![
			TokenInfo {
				token_id: "celo-mainnet:cents".to_string(),
				network_id: NetworkId::CeloMainnet,
				symbol: "CENTS".to_string(),
				decimals: 2,
				fee_currency_adapter_decimals: None,
			},
			TokenInfo {
				token_id: "celo-mainnet:usdc".to_string(),
				network_id: NetworkId::CeloMainnet,
				symbol: "USDC".to_string(),
				decimals: 6,
				fee_currency_adapter_decimals: Some(18),
			},
		]))
	}

	fn reconciler(chain: FakeChain, store: Arc<dyn TransactionStore>) -> StatusReconciler {
		StatusReconciler::new(
			Arc::new(chain.into_service(NetworkId::CeloMainnet)),
			store,
			registry(),
			EventBus::new(16),
		)
	}

	#[test]
	fn test_receipt_status_mapping() {
		assert_eq!(receipt_status(ReceiptStatus::Success), TransactionStatus::Complete);
		assert_eq!(receipt_status(ReceiptStatus::Reverted), TransactionStatus::Failed);
		assert_eq!(receipt_status(ReceiptStatus::Absent), TransactionStatus::Failed);
	}

	#[tokio::test]
	async fn test_fee_uses_exact_arithmetic() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());
		let mut mined = receipt(0x01, ReceiptStatus::Success);
		mined.gas_used = U256::from(100u64);
		mined.effective_gas_price = U256::from(2u64);

		let update = reconciler
			.reconcile(
				"tx-1",
				&mined,
				NetworkId::CeloMainnet,
				Some("celo-mainnet:cents"),
				None,
			)
			.await
			.unwrap();

		assert_eq!(update.fees.len(), 1);
		assert_eq!(update.fees[0].amount.value, "2");
		assert_eq!(update.fees[0].amount.token_id, "celo-mainnet:cents");
	}

	#[tokio::test]
	async fn test_fee_prefers_adapter_decimals() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());
		let mut mined = receipt(0x01, ReceiptStatus::Success);
		mined.gas_used = U256::from(2_000_000u64);
		mined.effective_gas_price = U256::from(1_000_000_000u64);

		let update = reconciler
			.reconcile(
				"tx-1",
				&mined,
				NetworkId::CeloMainnet,
				Some("celo-mainnet:usdc"),
				None,
			)
			.await
			.unwrap();

		assert_eq!(update.fees[0].amount.value, "0.002");
	}

	#[tokio::test]
	async fn test_overflowing_fee_is_omitted() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());
		let mut mined = receipt(0x01, ReceiptStatus::Success);
		mined.gas_used = U256::MAX;
		mined.effective_gas_price = U256::from(2u64);

		let update = reconciler
			.reconcile(
				"tx-1",
				&mined,
				NetworkId::CeloMainnet,
				Some("celo-mainnet:cents"),
				None,
			)
			.await
			.unwrap();

		assert!(update.fees.is_empty());
		assert_eq!(update.status, TransactionStatus::Complete);
	}

	#[tokio::test]
	async fn test_unknown_fee_token_omits_fees() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());

		let update = reconciler
			.reconcile(
				"tx-1",
				&receipt(0x01, ReceiptStatus::Success),
				NetworkId::CeloMainnet,
				Some("celo-mainnet:unknown"),
				None,
			)
			.await
			.unwrap();

		assert!(update.fees.is_empty());
		assert_eq!(update.status, TransactionStatus::Complete);
	}

	#[tokio::test]
	async fn test_reverted_receipt_fails_transaction() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());

		reconciler
			.reconcile(
				"tx-1",
				&receipt(0x01, ReceiptStatus::Reverted),
				NetworkId::CeloMainnet,
				None,
				None,
			)
			.await
			.unwrap();

		let stored = store.get_transaction("tx-1").await.unwrap();
		assert_eq!(stored.status, TransactionStatus::Failed);
		assert_eq!(stored.block.as_deref(), Some("123"));
		assert_eq!(stored.timestamp, 1_701_102_971_000);
		assert!(stored.fees.is_empty());
	}

	#[tokio::test]
	async fn test_override_takes_precedence() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store.clone());

		let update = reconciler
			.reconcile(
				"tx-1",
				&receipt(0x01, ReceiptStatus::Reverted),
				NetworkId::CeloMainnet,
				None,
				Some(TransactionStatus::Pending),
			)
			.await
			.unwrap();

		assert_eq!(update.status, TransactionStatus::Pending);
	}

	#[tokio::test]
	async fn test_block_failure_leaves_store_untouched() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default().failing_blocks(), store.clone());

		let result = reconciler
			.reconcile(
				"tx-1",
				&receipt(0x01, ReceiptStatus::Success),
				NetworkId::CeloMainnet,
				None,
				None,
			)
			.await;

		assert!(matches!(result, Err(WatcherError::Rpc(_))));
		assert!(store.get_transaction("tx-1").await.unwrap().is_pending());
	}

	#[tokio::test]
	async fn test_reconciled_event_is_published() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let reconciler = reconciler(FakeChain::default(), store);
		let mut events = reconciler.event_bus.subscribe();

		let update = reconciler
			.reconcile(
				"tx-1",
				&receipt(0x01, ReceiptStatus::Success),
				NetworkId::CeloMainnet,
				None,
				None,
			)
			.await
			.unwrap();

		assert_eq!(
			events.recv().await.unwrap(),
			WatcherEvent::ReceiptReconciled(update)
		);
	}
}
