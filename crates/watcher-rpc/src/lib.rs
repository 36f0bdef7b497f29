//! Chain-RPC access for the pending transaction watcher.
//!
//! This module abstracts the read-only chain calls the watcher needs (waiting
//! for a receipt, fetching a block) behind [`ChainRpcInterface`], one client
//! per network, and routes calls by [`NetworkId`] through [`RpcService`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use watcher_types::{BlockInfo, NetworkId, TransactionHash, TransactionReceipt};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while talking to a chain.
///
/// Callers treat every variant as transient: the failed call is simply
/// retried on a later poll.
#[derive(Debug, Error)]
pub enum RpcError {
	/// Transport or node error.
	#[error("Network error: {0}")]
	Network(String),
	/// The receipt did not appear within the allowed time.
	#[error("Timed out after {0:?} waiting for receipt of {1}")]
	Timeout(Duration, TransactionHash),
	/// The node answered with something that could not be interpreted.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// No client is configured for the requested network.
	#[error("No provider available for network {0}")]
	NoProviderAvailable(NetworkId),
}

/// Read-only chain access for a single network.
#[async_trait]
pub trait ChainRpcInterface: Send + Sync {
	/// Waits until the transaction is mined and returns its receipt.
	///
	/// May suspend for as long as the implementation's own timeout allows.
	async fn wait_for_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, RpcError>;

	/// Fetches block metadata by number.
	async fn get_block(&self, block_number: u64) -> Result<BlockInfo, RpcError>;
}

/// Timing settings shared by RPC clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcSettings {
	/// Upper bound for a single `wait_for_transaction_receipt` call.
	pub receipt_timeout: Duration,
	/// Delay between receipt lookups while waiting.
	pub receipt_poll_interval: Duration,
}

impl Default for RpcSettings {
	fn default() -> Self {
		Self {
			receipt_timeout: Duration::from_secs(180),
			receipt_poll_interval: Duration::from_secs(4),
		}
	}
}

/// Routes chain calls to the client configured for each network.
#[derive(Clone, Default)]
pub struct RpcService {
	clients: HashMap<NetworkId, Arc<dyn ChainRpcInterface>>,
}

impl RpcService {
	pub fn new(clients: HashMap<NetworkId, Arc<dyn ChainRpcInterface>>) -> Self {
		Self { clients }
	}

	/// Networks that have a client, in a stable order.
	pub fn network_ids(&self) -> Vec<NetworkId> {
		let mut ids: Vec<NetworkId> = self.clients.keys().copied().collect();
		ids.sort();
		ids
	}

	pub fn has_network(&self, network_id: NetworkId) -> bool {
		self.clients.contains_key(&network_id)
	}

	fn client(&self, network_id: NetworkId) -> Result<&Arc<dyn ChainRpcInterface>, RpcError> {
		self.clients
			.get(&network_id)
			.ok_or(RpcError::NoProviderAvailable(network_id))
	}

	/// Waits for the receipt of `hash` on `network_id`.
	pub async fn wait_for_transaction_receipt(
		&self,
		network_id: NetworkId,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, RpcError> {
		self.client(network_id)?
			.wait_for_transaction_receipt(hash)
			.await
	}

	/// Fetches block `block_number` on `network_id`.
	pub async fn get_block(
		&self,
		network_id: NetworkId,
		block_number: u64,
	) -> Result<BlockInfo, RpcError> {
		self.client(network_id)?.get_block(block_number).await
	}
}
