//! Standby transaction records and the receipt updates applied to them.
//!
//! A standby transaction is created locally when a transaction is broadcast
//! and stays `Pending` until the watcher reconciles its receipt. The
//! [`CanonicalReceiptUpdate`] is the only shape in which the watcher writes
//! back to the transaction store.

use crate::{NetworkId, TransactionHash};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a transaction as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
	Pending,
	Complete,
	Failed,
}

/// Correlation data addressing the owning transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
	pub id: String,
}

/// An amount of a token, with the value kept as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
	pub value: String,
	pub token_id: String,
}

/// Transaction type, tagged by `type`.
///
/// Swap variants carry both legs so that reward events can name the tokens
/// involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
	Sent,
	Received,
	Exchange,
	NftReceived,
	NftSent,
	SwapTransaction {
		in_amount: TokenAmount,
		out_amount: TokenAmount,
	},
	CrossChainSwapTransaction {
		in_amount: TokenAmount,
		out_amount: TokenAmount,
		/// Set once the source-network leg has been reconciled.
		#[serde(default)]
		is_source_network_tx_confirmed: bool,
	},
	Approval,
	Deposit,
	Withdraw,
	ClaimReward,
	EarnDeposit,
	EarnSwapDeposit,
	EarnWithdraw,
	EarnClaimReward,
}

impl TransactionKind {
	pub fn is_swap(&self) -> bool {
		matches!(self, TransactionKind::SwapTransaction { .. })
	}

	pub fn is_cross_chain_swap(&self) -> bool {
		matches!(self, TransactionKind::CrossChainSwapTransaction { .. })
	}

	/// Whether this is a cross-chain swap whose source leg was already reconciled.
	pub fn is_confirmed_cross_chain_source(&self) -> bool {
		matches!(
			self,
			TransactionKind::CrossChainSwapTransaction {
				is_source_network_tx_confirmed: true,
				..
			}
		)
	}

	/// The `(from, to)` token ids of a swap, `None` for other kinds.
	pub fn swap_token_ids(&self) -> Option<(&str, &str)> {
		match self {
			TransactionKind::SwapTransaction {
				in_amount,
				out_amount,
			}
			| TransactionKind::CrossChainSwapTransaction {
				in_amount,
				out_amount,
				..
			} => Some((out_amount.token_id.as_str(), in_amount.token_id.as_str())),
			_ => None,
		}
	}
}

/// Kind of fee attached to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeType {
	#[serde(rename = "SECURITY_FEE")]
	SecurityFee,
}

/// A fee paid by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
	#[serde(rename = "type")]
	pub fee_type: FeeType,
	pub amount: TokenAmount,
}

/// A locally known transaction, as kept by the transaction store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandbyTransaction {
	pub context: TransactionContext,
	pub network_id: NetworkId,
	#[serde(flatten)]
	pub kind: TransactionKind,
	/// Hash of the broadcast transaction, absent until broadcast.
	#[serde(default)]
	pub transaction_hash: Option<TransactionHash>,
	/// Token used to pay for gas, when not the native currency.
	#[serde(default)]
	pub fee_currency_id: Option<String>,
	pub status: TransactionStatus,
	#[serde(default)]
	pub block: Option<String>,
	#[serde(default)]
	pub fees: Vec<Fee>,
	/// Creation time, replaced by the block time once confirmed (milliseconds).
	pub timestamp: u64,
}

impl StandbyTransaction {
	pub fn id(&self) -> &str {
		&self.context.id
	}

	pub fn is_pending(&self) -> bool {
		self.status == TransactionStatus::Pending
	}

	/// Merges a receipt update into this record.
	///
	/// Applying the same update twice leaves the record unchanged.
	pub fn apply_receipt_update(&mut self, update: &CanonicalReceiptUpdate) {
		self.status = update.status;
		self.transaction_hash = Some(update.transaction_hash.clone());
		self.block = Some(update.block.clone());
		self.timestamp = update.block_timestamp_in_ms;
		self.fees = update.fees.clone();
		if let TransactionKind::CrossChainSwapTransaction {
			is_source_network_tx_confirmed,
			..
		} = &mut self.kind
		{
			*is_source_network_tx_confirmed = true;
		}
	}
}

/// Reconciled receipt details written back to the transaction store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalReceiptUpdate {
	/// Correlation id of the owning transaction record.
	pub tx_id: String,
	pub transaction_hash: TransactionHash,
	pub block: String,
	pub status: TransactionStatus,
	pub fees: Vec<Fee>,
	pub block_timestamp_in_ms: u64,
}
