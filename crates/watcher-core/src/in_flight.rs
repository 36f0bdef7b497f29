//! Registry of receipt fetches currently running.
//!
//! A fetch can outlive several polling cycles while it waits for a receipt.
//! The registry lets later cycles see that a hash is already being waited on.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use watcher_types::{NetworkId, TransactionHash};

type InFlightKey = (NetworkId, TransactionHash);

/// Shared set of `(network, hash)` pairs with a fetch in progress.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
	entries: Arc<DashMap<InFlightKey, ()>>,
}

impl InFlightRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims `hash` on `network_id`.
	///
	/// Returns `None` if another fetch already holds the claim. The claim is
	/// released when the returned guard is dropped.
	pub fn try_claim(
		&self,
		network_id: NetworkId,
		hash: &TransactionHash,
	) -> Option<InFlightGuard> {
		let key = (network_id, hash.clone());
		match self.entries.entry(key.clone()) {
			Entry::Occupied(_) => None,
			Entry::Vacant(slot) => {
				slot.insert(());
				Some(InFlightGuard {
					entries: Arc::clone(&self.entries),
					key,
				})
			},
		}
	}

	pub fn contains(&self, network_id: NetworkId, hash: &TransactionHash) -> bool {
		self.entries.contains_key(&(network_id, hash.clone()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Releases its claim on drop, including when the fetch task is aborted.
#[derive(Debug)]
pub struct InFlightGuard {
	entries: Arc<DashMap<InFlightKey, ()>>,
	key: InFlightKey,
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.entries.remove(&self.key);
	}
}
