//! Receipt types produced by the chain-RPC collaborator.
//!
//! This module defines transaction hashes, receipts, and block metadata as
//! the watcher sees them, independent of the RPC client library in use.

use crate::utils::{with_0x_prefix, without_0x_prefix};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Blockchain transaction hash representation.
///
/// Stores the raw hash bytes. Serialized and displayed as a `0x`-prefixed
/// lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
	pub fn to_hex(&self) -> String {
		with_0x_prefix(&hex::encode(&self.0))
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl FromStr for TransactionHash {
	type Err = hex::FromHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = without_0x_prefix(s);
		// Tolerate odd-length hashes such as "0x123" by left-padding a nibble.
		let bytes = if digits.len() % 2 == 1 {
			hex::decode(format!("0{}", digits))?
		} else {
			hex::decode(digits)?
		};
		Ok(TransactionHash(bytes))
	}
}

impl Serialize for TransactionHash {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex())
	}
}

impl<'de> Deserialize<'de> for TransactionHash {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse()
			.map_err(|e| serde::de::Error::custom(format!("Invalid transaction hash '{}': {}", s, e)))
	}
}

/// Chain-reported outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
	Success,
	Reverted,
	/// The receipt carries no status field (pre-EIP-658 chains).
	Absent,
}

impl ReceiptStatus {
	pub fn is_success(&self) -> bool {
		matches!(self, ReceiptStatus::Success)
	}
}

impl From<bool> for ReceiptStatus {
	fn from(success: bool) -> Self {
		if success {
			ReceiptStatus::Success
		} else {
			ReceiptStatus::Reverted
		}
	}
}

/// Raw event log attached to a receipt. Not interpreted by the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
	pub address: Address,
	pub topics: Vec<[u8; 32]>,
	pub data: Vec<u8>,
}

/// Transaction receipt containing execution and fee details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// Execution outcome reported by the chain.
	pub status: ReceiptStatus,
	/// Gas consumed by the transaction.
	pub gas_used: U256,
	/// Price paid per unit of gas, in the fee token's smallest unit.
	pub effective_gas_price: U256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	#[serde(default)]
	pub logs: Vec<ReceiptLog>,
}

/// Block metadata needed to timestamp a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
	pub number: u64,
	/// Block timestamp in seconds since the Unix epoch.
	pub timestamp: u64,
}
