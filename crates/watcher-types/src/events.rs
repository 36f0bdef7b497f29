//! Event types for inter-component communication.
//!
//! Events flow through the watcher's event bus so that downstream consumers
//! (reward tracking, observers) can react to reconciled transactions without
//! the watcher depending on them.

use crate::{CanonicalReceiptUpdate, NetworkId, TransactionHash};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all watcher events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatcherEvent {
	/// A receipt update was written to the transaction store.
	ReceiptReconciled(CanonicalReceiptUpdate),
	/// A rewards-eligible activity completed on-chain.
	Points(PointsEvent),
}

/// Fire-and-forget activity event consumed by the rewards system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEvent {
	pub activity_id: PointsActivity,
	pub transaction_hash: TransactionHash,
	pub network_id: NetworkId,
	pub from_token_id: String,
	pub to_token_id: String,
}

/// Activities that earn points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsActivity {
	Swap,
}
