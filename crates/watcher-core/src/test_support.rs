//! Fakes shared by the unit tests of this crate.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use watcher_rpc::{ChainRpcInterface, RpcError, RpcService};
use watcher_storage::implementations::memory::MemoryTransactionStore;
use watcher_types::{
	BlockInfo, NetworkId, ReceiptStatus, StandbyTransaction, TokenAmount, TransactionContext,
	TransactionHash, TransactionKind, TransactionReceipt, TransactionStatus,
};

pub const BLOCK_NUMBER: u64 = 123;
pub const BLOCK_TIMESTAMP: u64 = 1_701_102_971;

pub fn hash(byte: u8) -> TransactionHash {
	TransactionHash(vec![byte; 32])
}

pub fn receipt(byte: u8, status: ReceiptStatus) -> TransactionReceipt {
	TransactionReceipt {
		hash: hash(byte),
		status,
		gas_used: U256::from(21_000u64),
		effective_gas_price: U256::from(1u64),
		block_number: BLOCK_NUMBER,
		logs: vec![],
	}
}

pub fn standby(id: &str, byte: u8, kind: TransactionKind) -> StandbyTransaction {
	StandbyTransaction {
		context: TransactionContext { id: id.to_string() },
		network_id: NetworkId::CeloMainnet,
		kind,
		transaction_hash: Some(hash(byte)),
		fee_currency_id: None,
		status: TransactionStatus::Pending,
		block: None,
		fees: vec![],
		timestamp: 1_000,
	}
}

pub fn swap() -> TransactionKind {
	TransactionKind::SwapTransaction {
		in_amount: TokenAmount {
			value: "2.93".to_string(),
			token_id: "celo-mainnet:ceur".to_string(),
		},
		out_amount: TokenAmount {
			value: "2.87".to_string(),
			token_id: "celo-mainnet:cusd".to_string(),
		},
	}
}

pub fn cross_chain_swap(confirmed: bool) -> TransactionKind {
	TransactionKind::CrossChainSwapTransaction {
		in_amount: TokenAmount {
			value: "0.01".to_string(),
			token_id: "op-mainnet:native".to_string(),
		},
		out_amount: TokenAmount {
			value: "30".to_string(),
			token_id: "celo-mainnet:cusd".to_string(),
		},
		is_source_network_tx_confirmed: confirmed,
	}
}

pub fn store_with(records: Vec<StandbyTransaction>) -> Arc<MemoryTransactionStore> {
	Arc::new(MemoryTransactionStore::with_transactions(records))
}

/// How the fake answers a receipt request for a given hash.
#[derive(Debug, Clone, Copy)]
pub enum ReceiptOutcome {
	Mined(ReceiptStatus),
	Error,
	/// Never resolves, like a transaction that is not mined yet.
	Pending,
}

/// Scripted chain. Unscripted hashes are mined successfully.
#[derive(Clone, Default)]
pub struct FakeChain {
	outcomes: HashMap<TransactionHash, ReceiptOutcome>,
	fail_blocks: bool,
	pub receipt_calls: Arc<AtomicUsize>,
	pub block_calls: Arc<AtomicUsize>,
}

impl FakeChain {
	pub fn with_outcome(mut self, byte: u8, outcome: ReceiptOutcome) -> Self {
		self.outcomes.insert(hash(byte), outcome);
		self
	}

	pub fn failing_blocks(mut self) -> Self {
		self.fail_blocks = true;
		self
	}

	pub fn receipt_calls(&self) -> usize {
		self.receipt_calls.load(Ordering::SeqCst)
	}

	pub fn block_calls(&self) -> usize {
		self.block_calls.load(Ordering::SeqCst)
	}

	pub fn into_service(self, network_id: NetworkId) -> RpcService {
		let mut clients: HashMap<NetworkId, Arc<dyn ChainRpcInterface>> = HashMap::new();
		clients.insert(network_id, Arc::new(self));
		RpcService::new(clients)
	}
}

#[async_trait]
impl ChainRpcInterface for FakeChain {
	async fn wait_for_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, RpcError> {
		self.receipt_calls.fetch_add(1, Ordering::SeqCst);
		let outcome = self
			.outcomes
			.get(hash)
			.copied()
			.unwrap_or(ReceiptOutcome::Mined(ReceiptStatus::Success));
		match outcome {
			ReceiptOutcome::Mined(status) => Ok(TransactionReceipt {
				hash: hash.clone(),
				..receipt(0, status)
			}),
			ReceiptOutcome::Error => Err(RpcError::Network("connection reset".to_string())),
			ReceiptOutcome::Pending => std::future::pending().await,
		}
	}

	async fn get_block(&self, block_number: u64) -> Result<BlockInfo, RpcError> {
		self.block_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_blocks {
			return Err(RpcError::Network("block unavailable".to_string()));
		}
		Ok(BlockInfo {
			number: block_number,
			timestamp: BLOCK_TIMESTAMP,
		})
	}
}
