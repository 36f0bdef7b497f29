//! Supervisor owning one watch loop per supported network.

use crate::clock::polling_interval;
use crate::event_bus::EventBus;
use crate::features::NetworkFeatures;
use crate::fetcher::ReceiptFetcher;
use crate::in_flight::InFlightRegistry;
use crate::reconciler::StatusReconciler;
use crate::tokens::TokenRegistry;
use crate::watch_loop::NetworkWatchLoop;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use watcher_rpc::RpcService;
use watcher_storage::TransactionStore;
use watcher_types::NetworkId;

/// Tunables for the watcher that do not belong to a single collaborator.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
	/// Skip fetching a hash that already has a fetch running.
	pub dedupe_in_flight: bool,
	/// Per-network polling interval overrides in milliseconds.
	pub polling_intervals_ms: HashMap<NetworkId, u64>,
}

impl Default for WatcherOptions {
	fn default() -> Self {
		Self {
			dedupe_in_flight: true,
			polling_intervals_ms: HashMap::new(),
		}
	}
}

/// Starts and owns the per-network watch loops.
pub struct WatcherSupervisor {
	rpc: Arc<RpcService>,
	store: Arc<dyn TransactionStore>,
	features: Arc<dyn NetworkFeatures>,
	fetcher: Arc<ReceiptFetcher>,
	event_bus: EventBus,
	polling_intervals_ms: HashMap<NetworkId, u64>,
}

impl WatcherSupervisor {
	pub fn new(
		rpc: Arc<RpcService>,
		store: Arc<dyn TransactionStore>,
		tokens: Arc<TokenRegistry>,
		features: Arc<dyn NetworkFeatures>,
		event_bus: EventBus,
		options: WatcherOptions,
	) -> Self {
		let reconciler = Arc::new(StatusReconciler::new(
			rpc.clone(),
			store.clone(),
			tokens,
			event_bus.clone(),
		));
		let fetcher = Arc::new(ReceiptFetcher::new(
			rpc.clone(),
			reconciler,
			event_bus.clone(),
			options.dedupe_in_flight.then(InFlightRegistry::new),
		));

		Self {
			rpc,
			store,
			features,
			fetcher,
			event_bus,
			polling_intervals_ms: options.polling_intervals_ms,
		}
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Networks that have an RPC client and are enabled for send or swap.
	///
	/// Enabled networks without a client are logged and left out.
	pub fn watched_networks(&self) -> Vec<NetworkId> {
		let enabled: BTreeSet<NetworkId> =
			self.features.supported_network_ids().into_iter().collect();

		for network_id in enabled.iter().filter(|id| !self.rpc.has_network(**id)) {
			tracing::warn!(
				network_id = %network_id,
				"Network is enabled but has no RPC client, not watching"
			);
		}

		self.rpc
			.network_ids()
			.into_iter()
			.filter(|id| enabled.contains(id))
			.collect()
	}

	fn watch_loop(&self, network_id: NetworkId) -> NetworkWatchLoop {
		let interval = polling_interval(
			network_id.network(),
			self.polling_intervals_ms.get(&network_id).copied(),
		);
		NetworkWatchLoop::new(
			network_id,
			interval,
			Arc::clone(&self.store),
			Arc::clone(&self.fetcher),
		)
	}

	/// Spawns one loop per watched network.
	pub fn start(self) -> WatcherHandle {
		let networks = self.watched_networks();
		let mut loops = JoinSet::new();
		for network_id in &networks {
			loops.spawn(self.watch_loop(*network_id).run());
		}

		tracing::info!(
			networks = ?networks.iter().map(NetworkId::as_str).collect::<Vec<_>>(),
			"Transaction watcher started"
		);

		WatcherHandle { networks, loops }
	}
}

/// Running watcher. Dropping it cancels every loop and fetch.
pub struct WatcherHandle {
	networks: Vec<NetworkId>,
	loops: JoinSet<()>,
}

impl WatcherHandle {
	/// Networks with a running loop.
	pub fn networks(&self) -> &[NetworkId] {
		&self.networks
	}

	/// Cancels every loop, and with them their fetches, and waits for them to stop.
	pub async fn shutdown(mut self) {
		self.loops.shutdown().await;
		tracing::info!("Transaction watcher stopped");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{standby, store_with, FakeChain, ReceiptOutcome};
	use std::time::Duration;
	use watcher_config::FeaturesConfig;
	use watcher_rpc::ChainRpcInterface;
	use watcher_types::{TransactionKind, TransactionStatus};

	fn features() -> Arc<dyn NetworkFeatures> {
		Arc::new(FeaturesConfig {
			send_network_ids: vec![NetworkId::CeloMainnet],
			swap_network_ids: vec![
				NetworkId::EthereumMainnet,
				NetworkId::BaseMainnet,
				NetworkId::CeloMainnet,
			],
		})
	}

	fn rpc(chain: &FakeChain, networks: &[NetworkId]) -> Arc<RpcService> {
		let clients: HashMap<NetworkId, Arc<dyn ChainRpcInterface>> = networks
			.iter()
			.map(|id| (*id, Arc::new(chain.clone()) as Arc<dyn ChainRpcInterface>))
			.collect();
		Arc::new(RpcService::new(clients))
	}

	fn supervisor(
		chain: &FakeChain,
		store: Arc<dyn TransactionStore>,
		options: WatcherOptions,
	) -> WatcherSupervisor {
		WatcherSupervisor::new(
			rpc(
				chain,
				&[NetworkId::CeloMainnet, NetworkId::EthereumMainnet, NetworkId::OpMainnet],
			),
			store,
			Arc::new(TokenRegistry::default()),
			features(),
			EventBus::new(16),
			options,
		)
	}

	#[test]
	fn test_watches_intersection_of_rpc_and_features() {
		let supervisor = supervisor(
			&FakeChain::default(),
			store_with(vec![]),
			WatcherOptions::default(),
		);
		assert_eq!(
			supervisor.watched_networks(),
			vec![NetworkId::CeloMainnet, NetworkId::EthereumMainnet]
		);
	}

	#[test]
	fn test_loop_interval_uses_override_and_floor() {
		let mut options = WatcherOptions::default();
		options.polling_intervals_ms.insert(NetworkId::EthereumMainnet, 500);
		let supervisor = supervisor(&FakeChain::default(), store_with(vec![]), options);

		assert_eq!(
			supervisor.watch_loop(NetworkId::CeloMainnet).interval(),
			Duration::from_millis(5_000)
		);
		assert_eq!(
			supervisor.watch_loop(NetworkId::EthereumMainnet).interval(),
			Duration::from_millis(2_000)
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_start_reconciles_each_network_independently() {
		let mut eth = standby("tx-2", 0x02, TransactionKind::Sent);
		eth.network_id = NetworkId::EthereumMainnet;
		let mut op = standby("tx-3", 0x03, TransactionKind::Sent);
		op.network_id = NetworkId::OpMainnet;
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent), eth, op]);
		let chain = FakeChain::default();

		let handle = supervisor(&chain, store.clone(), WatcherOptions::default()).start();
		assert_eq!(
			handle.networks(),
			&[NetworkId::CeloMainnet, NetworkId::EthereumMainnet]
		);

		tokio::time::sleep(Duration::from_millis(100)).await;

		for id in ["tx-1", "tx-2"] {
			assert_eq!(
				store.get_transaction(id).await.unwrap().status,
				TransactionStatus::Complete
			);
		}
		assert!(store.get_transaction("tx-3").await.unwrap().is_pending());

		handle.shutdown().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_shutdown_stops_polling() {
		let store = store_with(vec![standby("tx-1", 0x01, TransactionKind::Sent)]);
		let chain = FakeChain::default().with_outcome(0x01, ReceiptOutcome::Error);

		let handle = supervisor(&chain, store, WatcherOptions::default()).start();
		tokio::time::sleep(Duration::from_millis(100)).await;
		let calls = chain.receipt_calls();
		assert_eq!(calls, 1);

		handle.shutdown().await;
		tokio::time::sleep(Duration::from_secs(60)).await;
		assert_eq!(chain.receipt_calls(), calls);
	}
}
