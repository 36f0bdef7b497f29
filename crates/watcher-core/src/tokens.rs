//! Token metadata lookups for fee rendering.

use std::collections::HashMap;
use watcher_types::{NetworkId, TokenInfo};

/// Registry of fee-capable tokens, keyed by network and token id.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
	tokens: HashMap<(NetworkId, String), TokenInfo>,
}

impl TokenRegistry {
	pub fn new(tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
		Self {
			tokens: tokens
				.into_iter()
				.map(|token| ((token.network_id, token.token_id.clone()), token))
				.collect(),
		}
	}

	/// Looks up `token_id` among the tokens of `network_id` only.
	pub fn get(&self, network_id: NetworkId, token_id: &str) -> Option<&TokenInfo> {
		self.tokens.get(&(network_id, token_id.to_string()))
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}
