//! Builder assembling a [`WatcherSupervisor`] from configuration.
//!
//! Backends are created through factory functions so that the binary decides
//! which storage implementations and RPC clients are available.

use crate::event_bus::EventBus;
use crate::supervisor::{WatcherOptions, WatcherSupervisor};
use crate::tokens::TokenRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use watcher_config::Config;
use watcher_rpc::{ChainRpcInterface, RpcError, RpcService, RpcSettings};
use watcher_storage::{StorageError, TransactionStore};
use watcher_types::{NetworkId, NetworksConfig};

/// Errors that can occur while assembling the watcher.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("RPC setup error: {0}")]
	Rpc(#[from] RpcError),
}

/// Factory functions for the pluggable parts of the watcher.
pub struct WatcherFactories<SF, RF> {
	pub storage_factories: HashMap<String, SF>,
	pub rpc_factory: RF,
}

pub struct WatcherBuilder {
	config: Config,
}

impl WatcherBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// RPC timing derived from the `[watcher]` section.
	pub fn rpc_settings(&self) -> RpcSettings {
		RpcSettings {
			receipt_timeout: Duration::from_secs(self.config.watcher.receipt_timeout_seconds),
			receipt_poll_interval: Duration::from_millis(
				self.config.watcher.receipt_poll_interval_ms,
			),
		}
	}

	pub fn build<SF, RF>(
		self,
		factories: WatcherFactories<SF, RF>,
	) -> Result<WatcherSupervisor, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn TransactionStore>, StorageError>,
		RF: Fn(
			&NetworksConfig,
			RpcSettings,
		) -> Result<HashMap<NetworkId, Arc<dyn ChainRpcInterface>>, RpcError>,
	{
		let primary = &self.config.storage.primary;
		let storage_config = self.config.storage.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Primary storage '{}' is not configured", primary))
		})?;
		let factory = factories.storage_factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;
		let store: Arc<dyn TransactionStore> = match factory(storage_config) {
			Ok(store) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				Arc::from(store)
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)));
			},
		};

		let clients = (factories.rpc_factory)(&self.config.networks, self.rpc_settings())?;
		let rpc = Arc::new(RpcService::new(clients));
		tracing::info!(component = "rpc", networks = rpc.network_ids().len(), "Loaded");

		let tokens = Arc::new(TokenRegistry::new(self.config.tokens()));
		tracing::info!(component = "tokens", count = tokens.len(), "Loaded");

		let options = WatcherOptions {
			dedupe_in_flight: self.config.watcher.dedupe_in_flight,
			polling_intervals_ms: self
				.config
				.networks
				.iter()
				.filter_map(|(id, network)| network.polling_interval_ms.map(|ms| (*id, ms)))
				.collect(),
		};

		Ok(WatcherSupervisor::new(
			rpc,
			store,
			tokens,
			Arc::new(self.config.features.clone()),
			EventBus::new(self.config.watcher.event_bus_capacity),
			options,
		))
	}
}
