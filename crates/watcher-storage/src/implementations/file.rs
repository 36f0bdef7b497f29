//! File-backed transaction store.
//!
//! Records live in one JSON document that other processes may also write.
//! Every operation reads the current document, so records added after the
//! store was opened are seen by the next call. Writes go to a temporary
//! sibling file which is then renamed over the target, so a crash never
//! leaves a half-written store.

use crate::{merge_update, upsert, StorageError, TransactionStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use watcher_types::{
	CanonicalReceiptUpdate, ConfigSchema, Field, FieldType, Schema, StandbyTransaction,
	ValidationError,
};

/// Name under which this backend is selected in configuration.
pub const NAME: &str = "file";

/// Transaction store persisted to a JSON file.
pub struct FileTransactionStore {
	path: PathBuf,
	/// Serialises read-modify-write cycles issued through this store.
	lock: Mutex<()>,
}

impl FileTransactionStore {
	/// Opens the store at `path`, checking that an existing file is readable.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
		let path = path.into();
		let records = match std::fs::read(&path) {
			Ok(bytes) => decode(&bytes)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
			Err(e) => return Err(read_error(&path, e)),
		};

		tracing::debug!(path = %path.display(), records = records.len(), "Opened transaction file");

		Ok(Self {
			path,
			lock: Mutex::new(()),
		})
	}

	/// Reads the current document; a missing file holds no records.
	async fn load(&self) -> Result<Vec<StandbyTransaction>, StorageError> {
		match fs::read(&self.path).await {
			Ok(bytes) => decode(&bytes),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
			Err(e) => Err(read_error(&self.path, e)),
		}
	}

	async fn persist(&self, records: &[StandbyTransaction]) -> Result<(), StorageError> {
		let bytes = serde_json::to_vec_pretty(records)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let tmp_path = self.path.with_extension("json.tmp");
		fs::write(&tmp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&tmp_path, &self.path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

fn decode(bytes: &[u8]) -> Result<Vec<StandbyTransaction>, StorageError> {
	if bytes.is_empty() {
		return Ok(Vec::new());
	}
	serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn read_error(path: &std::path::Path, e: std::io::Error) -> StorageError {
	StorageError::Backend(format!("Failed to read {}: {}", path.display(), e))
}

#[async_trait]
impl TransactionStore for FileTransactionStore {
	async fn pending_transactions(&self) -> Result<Vec<StandbyTransaction>, StorageError> {
		let _guard = self.lock.lock().await;
		let records = self.load().await?;
		Ok(records.into_iter().filter(|tx| tx.is_pending()).collect())
	}

	async fn apply_receipt_update(
		&self,
		update: &CanonicalReceiptUpdate,
	) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut records = self.load().await?;
		merge_update(&mut records, update)?;
		self.persist(&records).await
	}

	async fn add_standby_transaction(&self, tx: StandbyTransaction) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut records = self.load().await?;
		upsert(&mut records, tx);
		self.persist(&records).await
	}

	async fn get_transaction(&self, tx_id: &str) -> Result<StandbyTransaction, StorageError> {
		let _guard = self.lock.lock().await;
		self.load()
			.await?
			.into_iter()
			.find(|tx| tx.id() == tx_id)
			.ok_or_else(|| StorageError::NotFound(tx_id.to_string()))
	}
}

/// Configuration schema for the file store.
///
/// Requires a non-empty `path` to the JSON document.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some("") => Err("path cannot be empty".to_string()),
					_ => Ok(()),
				}
			})],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file store from configuration.
///
/// Configuration parameters:
/// - `path`: location of the JSON document (created on first write)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn TransactionStore>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("path is required".to_string()))?;

	Ok(Box::new(FileTransactionStore::open(path)?))
}
