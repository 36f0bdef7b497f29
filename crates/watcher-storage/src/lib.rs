//! Transaction store for the pending transaction watcher.
//!
//! The store owns the locally known standby transactions. The watcher only
//! reads the pending subset and writes reconciled receipt updates back;
//! records are created elsewhere (at broadcast time).

use async_trait::async_trait;
use thiserror::Error;
use watcher_types::{CanonicalReceiptUpdate, StandbyTransaction};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// No transaction record has the requested id.
	#[error("Transaction not found: {0}")]
	NotFound(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every transaction store backend implements.
///
/// `apply_receipt_update` must be an atomic merge keyed by the update's
/// `tx_id`, so that applying the same update twice is harmless.
#[async_trait]
pub trait TransactionStore: Send + Sync {
	/// Returns every transaction whose status is still pending.
	async fn pending_transactions(&self) -> Result<Vec<StandbyTransaction>, StorageError>;

	/// Merges a reconciled receipt into the record identified by `update.tx_id`.
	async fn apply_receipt_update(&self, update: &CanonicalReceiptUpdate)
		-> Result<(), StorageError>;

	/// Inserts a transaction, replacing any record with the same id.
	async fn add_standby_transaction(&self, tx: StandbyTransaction) -> Result<(), StorageError>;

	/// Looks up a transaction by its correlation id.
	async fn get_transaction(&self, tx_id: &str) -> Result<StandbyTransaction, StorageError>;
}

/// Signature of the function each backend exposes to build itself from its
/// configuration table.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn TransactionStore>, StorageError>;

/// All available storage implementations as `(name, factory)` pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::NAME, file::create_storage as StorageFactory),
		(memory::NAME, memory::create_storage as StorageFactory),
	]
}

/// Upserts `tx` into an ordered list of records, keyed by context id.
pub(crate) fn upsert(records: &mut Vec<StandbyTransaction>, tx: StandbyTransaction) {
	match records.iter_mut().find(|existing| existing.id() == tx.id()) {
		Some(existing) => *existing = tx,
		None => records.push(tx),
	}
}

/// Applies `update` to the matching record in an ordered list.
pub(crate) fn merge_update(
	records: &mut [StandbyTransaction],
	update: &CanonicalReceiptUpdate,
) -> Result<(), StorageError> {
	let record = records
		.iter_mut()
		.find(|tx| tx.id() == update.tx_id)
		.ok_or_else(|| StorageError::NotFound(update.tx_id.clone()))?;
	record.apply_receipt_update(update);
	Ok(())
}
