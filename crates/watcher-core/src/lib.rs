//! Pending transaction watcher.
//!
//! For every network that has an RPC client and is enabled for send or swap,
//! a watch loop polls the transaction store for pending transactions, waits
//! for their receipts and reconciles them into a final status with fees.
//! Successful swaps additionally produce a points event on the event bus.

use thiserror::Error;
use watcher_rpc::RpcError;
use watcher_storage::StorageError;

pub mod builder;
pub mod clock;
pub mod event_bus;
pub mod features;
pub mod fetcher;
pub mod in_flight;
pub mod reconciler;
pub mod supervisor;
pub mod tokens;
pub mod watch_loop;

#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, WatcherBuilder, WatcherFactories};
pub use clock::{polling_interval, MIN_POLLING_INTERVAL};
pub use event_bus::EventBus;
pub use features::NetworkFeatures;
pub use fetcher::ReceiptFetcher;
pub use in_flight::InFlightRegistry;
pub use reconciler::StatusReconciler;
pub use supervisor::{WatcherHandle, WatcherOptions, WatcherSupervisor};
pub use tokens::TokenRegistry;
pub use watch_loop::NetworkWatchLoop;

/// Errors raised while reconciling a transaction.
#[derive(Debug, Error)]
pub enum WatcherError {
	#[error("RPC error: {0}")]
	Rpc(#[from] RpcError),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}
