//! Token metadata used when rendering fees.

use crate::NetworkId;
use serde::{Deserialize, Serialize};

/// Metadata for a token that can pay for gas on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
	pub token_id: String,
	pub network_id: NetworkId,
	pub symbol: String,
	pub decimals: u8,
	/// Precision used when gas is paid through a fee currency adapter
	/// instead of the token contract itself.
	pub fee_currency_adapter_decimals: Option<u8>,
}

impl TokenInfo {
	/// Decimal places to shift a raw gas fee by when it was paid in this token.
	pub fn fee_decimals(&self) -> u8 {
		self.fee_currency_adapter_decimals.unwrap_or(self.decimals)
	}
}
