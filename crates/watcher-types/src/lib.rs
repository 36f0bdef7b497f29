//! Common types module for the pending transaction watcher.
//!
//! This module defines the core data types shared by every watcher component:
//! networks, transactions and their receipts, token metadata, events, and
//! the configuration validation framework.

/// Event types published on the watcher event bus.
pub mod events;
/// Network identifiers and their mapping to chains.
pub mod networks;
/// Receipt and block types produced by the chain-RPC collaborator.
pub mod receipt;
/// Token metadata used for fee rendering.
pub mod tokens;
/// Standby transaction records and receipt updates.
pub mod transaction;
/// Utility functions for formatting and conversion.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use events::*;
pub use networks::{
	deserialize_networks, Network, NetworkConfig, NetworkId, NetworkIdParseError, NetworksConfig,
	TokenConfig,
};
pub use receipt::*;
pub use tokens::TokenInfo;
pub use transaction::*;
pub use utils::{format_token_amount, truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::*;
