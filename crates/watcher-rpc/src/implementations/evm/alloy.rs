//! Alloy-based EVM chain-RPC implementation.
//!
//! Reads receipts and blocks over JSON-RPC HTTP. One [`AlloyRpc`] serves one
//! network; [`create_rpc_clients`] builds the full per-network map from
//! configuration.

use crate::{ChainRpcInterface, RpcError, RpcSettings};
use alloy_consensus::{Eip658Value, TxReceipt};
use alloy_primitives::{FixedBytes, U256, U64};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::BlockNumberOrTag;
use alloy_transport_http::Http;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use watcher_types::{
	truncate_id, BlockInfo, NetworkConfig, NetworkId, NetworksConfig, ReceiptLog, ReceiptStatus,
	TransactionHash, TransactionReceipt,
};

type HttpProvider = Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>;

/// The only block field the watcher reads.
#[derive(Debug, Deserialize)]
struct BlockTimestamp {
	number: U64,
	timestamp: U64,
}

/// Alloy HTTP client for a single network.
pub struct AlloyRpc {
	network_id: NetworkId,
	provider: HttpProvider,
	settings: RpcSettings,
}

impl AlloyRpc {
	/// Creates a client for `network_id` talking to `network.rpc_url`.
	pub fn new(
		network_id: NetworkId,
		network: &NetworkConfig,
		settings: RpcSettings,
	) -> Result<Self, RpcError> {
		let url = network.rpc_url.parse().map_err(|e| {
			RpcError::Network(format!("Invalid RPC URL for network {}: {}", network_id, e))
		})?;

		let provider = ProviderBuilder::new().on_http(url);

		Ok(Self {
			network_id,
			provider: Arc::new(provider) as HttpProvider,
			settings,
		})
	}

	async fn poll_receipt(&self, hash: &TransactionHash) -> Result<TransactionReceipt, RpcError> {
		if hash.0.len() != 32 {
			return Err(RpcError::InvalidResponse(format!(
				"Transaction hash {} is not 32 bytes",
				hash
			)));
		}
		let tx_hash = FixedBytes::<32>::from_slice(&hash.0);

		loop {
			match self.provider.get_transaction_receipt(tx_hash).await {
				Ok(Some(receipt)) => {
					let block_number = receipt.block_number.ok_or_else(|| {
						RpcError::InvalidResponse(format!("Receipt for {} has no block number", hash))
					})?;

					let logs = receipt
						.inner
						.logs()
						.iter()
						.map(|log| ReceiptLog {
							address: log.inner.address,
							topics: log.inner.data.topics().iter().map(|t| t.0).collect(),
							data: log.inner.data.data.to_vec(),
						})
						.collect();

					return Ok(TransactionReceipt {
						hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
						status: receipt_status(receipt.inner.status_or_post_state()),
						gas_used: U256::from(receipt.gas_used),
						effective_gas_price: U256::from(receipt.effective_gas_price),
						block_number,
						logs,
					});
				},
				Ok(None) => {
					tracing::trace!(
						network_id = %self.network_id,
						tx_hash = %truncate_id(&hash.to_hex()),
						"Receipt not available yet"
					);
					tokio::time::sleep(self.settings.receipt_poll_interval).await;
				},
				Err(e) => {
					return Err(RpcError::Network(format!(
						"Failed to get receipt on {}: {}",
						self.network_id, e
					)));
				},
			}
		}
	}
}

#[async_trait]
impl ChainRpcInterface for AlloyRpc {
	async fn wait_for_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, RpcError> {
		tokio::time::timeout(self.settings.receipt_timeout, self.poll_receipt(hash))
			.await
			.map_err(|_| RpcError::Timeout(self.settings.receipt_timeout, hash.clone()))?
	}

	async fn get_block(&self, block_number: u64) -> Result<BlockInfo, RpcError> {
		let block: Option<BlockTimestamp> = self
			.provider
			.client()
			.request(
				"eth_getBlockByNumber",
				(BlockNumberOrTag::Number(block_number), false),
			)
			.await
			.map_err(|e| {
				RpcError::Network(format!(
					"Failed to get block {} on {}: {}",
					block_number, self.network_id, e
				))
			})?;

		let block = block.ok_or_else(|| {
			RpcError::InvalidResponse(format!(
				"Block {} not found on {}",
				block_number, self.network_id
			))
		})?;

		Ok(BlockInfo {
			number: block.number.to::<u64>(),
			timestamp: block.timestamp.to::<u64>(),
		})
	}
}

/// Maps a receipt outcome to a status.
///
/// Pre-Byzantium receipts carry a post-state root instead of a status flag
/// and do not prove success.
fn receipt_status(outcome: Eip658Value) -> ReceiptStatus {
	match outcome {
		Eip658Value::Eip658(succeeded) => ReceiptStatus::from(succeeded),
		Eip658Value::PostState(_) => ReceiptStatus::Absent,
	}
}

/// Builds one alloy client per configured network.
pub fn create_rpc_clients(
	networks: &NetworksConfig,
	settings: RpcSettings,
) -> Result<HashMap<NetworkId, Arc<dyn ChainRpcInterface>>, RpcError> {
	networks
		.iter()
		.map(|(network_id, network)| {
			let client = AlloyRpc::new(*network_id, network, settings)?;
			Ok((*network_id, Arc::new(client) as Arc<dyn ChainRpcInterface>))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn network(rpc_url: &str) -> NetworkConfig {
		NetworkConfig {
			rpc_url: rpc_url.to_string(),
			polling_interval_ms: None,
			tokens: vec![],
		}
	}

	#[test]
	fn test_receipt_status_from_outcome() {
		assert_eq!(receipt_status(Eip658Value::Eip658(true)), ReceiptStatus::Success);
		assert_eq!(receipt_status(Eip658Value::Eip658(false)), ReceiptStatus::Reverted);
		assert_eq!(
			receipt_status(Eip658Value::PostState(alloy_primitives::B256::ZERO)),
			ReceiptStatus::Absent
		);
	}

	#[test]
	fn test_invalid_url_is_rejected() {
		let result = AlloyRpc::new(
			NetworkId::CeloMainnet,
			&network("not a url"),
			RpcSettings::default(),
		);
		assert!(matches!(result, Err(RpcError::Network(msg)) if msg.contains("celo-mainnet")));
	}

	#[test]
	fn test_creates_client_per_network() {
		let mut networks = NetworksConfig::new();
		networks.insert(NetworkId::CeloMainnet, network("http://localhost:8545"));
		networks.insert(NetworkId::BaseSepolia, network("http://localhost:8546"));

		let clients = create_rpc_clients(&networks, RpcSettings::default()).unwrap();
		assert_eq!(clients.len(), 2);
		assert!(clients.contains_key(&NetworkId::BaseSepolia));
	}

	#[tokio::test]
	async fn test_short_hash_is_rejected_without_network_call() {
		let client = AlloyRpc::new(
			NetworkId::CeloMainnet,
			&network("http://localhost:1"),
			RpcSettings::default(),
		)
		.unwrap();
		let result = client
			.wait_for_transaction_receipt(&TransactionHash(vec![0x12, 0x34]))
			.await;
		assert!(matches!(result, Err(RpcError::InvalidResponse(_))));
	}
}
