//! Network identifiers for multi-chain transaction watching.
//!
//! A [`Network`] names a chain family (Celo, Ethereum, ...) while a
//! [`NetworkId`] names a concrete deployment of that chain (mainnet or a
//! testnet). Transactions carry a `NetworkId`; polling cadence is a property
//! of the `Network`.

use crate::TokenInfo;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chain families supported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
	Celo,
	Ethereum,
	Arbitrum,
	Optimism,
	PolygonPos,
	Base,
}

impl Network {
	/// All chain families, in a stable order.
	pub const ALL: [Network; 6] = [
		Network::Celo,
		Network::Ethereum,
		Network::Arbitrum,
		Network::Optimism,
		Network::PolygonPos,
		Network::Base,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Network::Celo => "celo",
			Network::Ethereum => "ethereum",
			Network::Arbitrum => "arbitrum",
			Network::Optimism => "optimism",
			Network::PolygonPos => "polygon-pos",
			Network::Base => "base",
		}
	}

	/// Approximate average block time of the chain, in milliseconds.
	pub fn average_block_time_ms(&self) -> u64 {
		match self {
			Network::Celo => 5_000,
			Network::Ethereum => 15_000,
			Network::Arbitrum | Network::Optimism | Network::PolygonPos | Network::Base => 2_000,
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a network id string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown network id '{0}'")]
pub struct NetworkIdParseError(pub String);

/// Concrete chain deployments a transaction can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetworkId {
	#[serde(rename = "celo-mainnet")]
	CeloMainnet,
	#[serde(rename = "celo-alfajores")]
	CeloAlfajores,
	#[serde(rename = "ethereum-mainnet")]
	EthereumMainnet,
	#[serde(rename = "ethereum-sepolia")]
	EthereumSepolia,
	#[serde(rename = "arbitrum-one")]
	ArbitrumOne,
	#[serde(rename = "arbitrum-sepolia")]
	ArbitrumSepolia,
	#[serde(rename = "op-mainnet")]
	OpMainnet,
	#[serde(rename = "op-sepolia")]
	OpSepolia,
	#[serde(rename = "polygon-pos-mainnet")]
	PolygonPosMainnet,
	#[serde(rename = "polygon-pos-amoy")]
	PolygonPosAmoy,
	#[serde(rename = "base-mainnet")]
	BaseMainnet,
	#[serde(rename = "base-sepolia")]
	BaseSepolia,
}

impl NetworkId {
	pub const ALL: [NetworkId; 12] = [
		NetworkId::CeloMainnet,
		NetworkId::CeloAlfajores,
		NetworkId::EthereumMainnet,
		NetworkId::EthereumSepolia,
		NetworkId::ArbitrumOne,
		NetworkId::ArbitrumSepolia,
		NetworkId::OpMainnet,
		NetworkId::OpSepolia,
		NetworkId::PolygonPosMainnet,
		NetworkId::PolygonPosAmoy,
		NetworkId::BaseMainnet,
		NetworkId::BaseSepolia,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			NetworkId::CeloMainnet => "celo-mainnet",
			NetworkId::CeloAlfajores => "celo-alfajores",
			NetworkId::EthereumMainnet => "ethereum-mainnet",
			NetworkId::EthereumSepolia => "ethereum-sepolia",
			NetworkId::ArbitrumOne => "arbitrum-one",
			NetworkId::ArbitrumSepolia => "arbitrum-sepolia",
			NetworkId::OpMainnet => "op-mainnet",
			NetworkId::OpSepolia => "op-sepolia",
			NetworkId::PolygonPosMainnet => "polygon-pos-mainnet",
			NetworkId::PolygonPosAmoy => "polygon-pos-amoy",
			NetworkId::BaseMainnet => "base-mainnet",
			NetworkId::BaseSepolia => "base-sepolia",
		}
	}

	/// The chain family this deployment belongs to.
	pub fn network(&self) -> Network {
		match self {
			NetworkId::CeloMainnet | NetworkId::CeloAlfajores => Network::Celo,
			NetworkId::EthereumMainnet | NetworkId::EthereumSepolia => Network::Ethereum,
			NetworkId::ArbitrumOne | NetworkId::ArbitrumSepolia => Network::Arbitrum,
			NetworkId::OpMainnet | NetworkId::OpSepolia => Network::Optimism,
			NetworkId::PolygonPosMainnet | NetworkId::PolygonPosAmoy => Network::PolygonPos,
			NetworkId::BaseMainnet | NetworkId::BaseSepolia => Network::Base,
		}
	}
}

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for NetworkId {
	type Err = NetworkIdParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		NetworkId::ALL
			.iter()
			.find(|id| id.as_str() == s)
			.copied()
			.ok_or_else(|| NetworkIdParseError(s.to_string()))
	}
}

/// Configuration for a token that may pay for gas on a network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
	pub token_id: String,
	pub symbol: String,
	pub decimals: u8,
	#[serde(default)]
	pub fee_currency_adapter_decimals: Option<u8>,
}

impl TokenConfig {
	pub fn to_token_info(&self, network_id: NetworkId) -> TokenInfo {
		TokenInfo {
			token_id: self.token_id.clone(),
			network_id,
			symbol: self.symbol.clone(),
			decimals: self.decimals,
			fee_currency_adapter_decimals: self.fee_currency_adapter_decimals,
		}
	}
}

/// Configuration for a single network deployment.
///
/// # Fields
///
/// * `rpc_url` - The HTTP(S) RPC endpoint used to read receipts and blocks
/// * `polling_interval_ms` - Overrides the chain's average block time as the
///   watch loop interval (still subject to the global floor)
/// * `tokens` - Tokens that can pay for gas on this network
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub rpc_url: String,
	#[serde(default)]
	pub polling_interval_ms: Option<u64>,
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
}

/// Network configurations keyed by network id.
pub type NetworksConfig = HashMap<NetworkId, NetworkConfig>;

/// Deserializes network configurations whose table keys are network id strings.
///
/// # Errors
///
/// Returns a deserialization error if a key is not a known network id or a
/// network table is malformed.
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	string_map
		.into_iter()
		.map(|(key, value)| {
			key.parse::<NetworkId>()
				.map(|network_id| (network_id, value))
				.map_err(serde::de::Error::custom)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_network_id_round_trips_through_str() {
		for id in NetworkId::ALL {
			assert_eq!(id.as_str().parse::<NetworkId>().unwrap(), id);
		}
		assert!("celo".parse::<NetworkId>().is_err());
	}

	#[test]
	fn test_network_id_maps_to_network() {
		assert_eq!(NetworkId::CeloAlfajores.network(), Network::Celo);
		assert_eq!(NetworkId::OpSepolia.network(), Network::Optimism);
		assert_eq!(NetworkId::PolygonPosAmoy.network(), Network::PolygonPos);
	}

	#[test]
	fn test_serde_uses_kebab_case_names() {
		let json = serde_json::to_string(&NetworkId::PolygonPosMainnet).unwrap();
		assert_eq!(json, "\"polygon-pos-mainnet\"");
		let json = serde_json::to_string(&Network::PolygonPos).unwrap();
		assert_eq!(json, "\"polygon-pos\"");
	}
}
