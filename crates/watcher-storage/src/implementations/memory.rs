//! In-memory transaction store.
//!
//! Useful for tests and for embedding the watcher in a process that owns the
//! transaction list itself. Nothing survives a restart.

use crate::{merge_update, upsert, StorageError, TransactionStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use watcher_types::{CanonicalReceiptUpdate, ConfigSchema, Schema, StandbyTransaction, ValidationError};

/// Name under which this backend is selected in configuration.
pub const NAME: &str = "memory";

/// In-memory store keeping records in insertion order.
#[derive(Clone, Default)]
pub struct MemoryTransactionStore {
	records: Arc<RwLock<Vec<StandbyTransaction>>>,
}

impl MemoryTransactionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store pre-populated with `records`.
	pub fn with_transactions(records: Vec<StandbyTransaction>) -> Self {
		Self {
			records: Arc::new(RwLock::new(records)),
		}
	}

	/// Snapshot of every record, pending or not.
	pub async fn all_transactions(&self) -> Vec<StandbyTransaction> {
		self.records.read().await.clone()
	}
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
	async fn pending_transactions(&self) -> Result<Vec<StandbyTransaction>, StorageError> {
		let records = self.records.read().await;
		Ok(records.iter().filter(|tx| tx.is_pending()).cloned().collect())
	}

	async fn apply_receipt_update(
		&self,
		update: &CanonicalReceiptUpdate,
	) -> Result<(), StorageError> {
		let mut records = self.records.write().await;
		merge_update(&mut records, update)
	}

	async fn add_standby_transaction(&self, tx: StandbyTransaction) -> Result<(), StorageError> {
		let mut records = self.records.write().await;
		upsert(&mut records, tx);
		Ok(())
	}

	async fn get_transaction(&self, tx_id: &str) -> Result<StandbyTransaction, StorageError> {
		let records = self.records.read().await;
		records
			.iter()
			.find(|tx| tx.id() == tx_id)
			.cloned()
			.ok_or_else(|| StorageError::NotFound(tx_id.to_string()))
	}
}

/// Configuration schema for the memory store; it takes no settings.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory store from configuration.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn TransactionStore>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryTransactionStore::new()))
}
