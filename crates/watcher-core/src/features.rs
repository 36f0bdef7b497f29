//! Product feature gating consulted when choosing networks to watch.

use std::collections::HashSet;
use watcher_config::FeaturesConfig;
use watcher_types::NetworkId;

/// Source of the networks on which send and swap are enabled.
pub trait NetworkFeatures: Send + Sync {
	fn supported_network_ids_for_send(&self) -> Vec<NetworkId>;

	fn supported_network_ids_for_swap(&self) -> Vec<NetworkId>;

	/// Union of the send and swap networks.
	fn supported_network_ids(&self) -> HashSet<NetworkId> {
		self.supported_network_ids_for_send()
			.into_iter()
			.chain(self.supported_network_ids_for_swap())
			.collect()
	}
}

impl NetworkFeatures for FeaturesConfig {
	fn supported_network_ids_for_send(&self) -> Vec<NetworkId> {
		self.send_network_ids.clone()
	}

	fn supported_network_ids_for_swap(&self) -> Vec<NetworkId> {
		self.swap_network_ids.clone()
	}
}
