//! Configuration module for the pending transaction watcher.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["networks.toml", "storage.toml"]` to include other files
//! - Each top-level section must be unique across all files

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use watcher_types::{deserialize_networks, NetworkId, NetworksConfig, TokenInfo};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering echoes the whole input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Settings for the watcher instance.
	pub watcher: WatcherConfig,
	/// Per-network RPC endpoints, polling overrides, and fee tokens.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
	/// Which networks currently have send and swap enabled.
	#[serde(default)]
	pub features: FeaturesConfig,
	/// Transaction store backend selection.
	pub storage: StorageConfig,
}

/// Settings for the watcher instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
	/// Identifier used in logs.
	pub id: String,
	/// How long a single receipt wait may take before it is abandoned
	/// until the next poll cycle. Defaults to 180 seconds.
	#[serde(default = "default_receipt_timeout_seconds")]
	pub receipt_timeout_seconds: u64,
	/// Interval between receipt lookups while waiting. Defaults to 4000 ms.
	#[serde(default = "default_receipt_poll_interval_ms")]
	pub receipt_poll_interval_ms: u64,
	/// Skip starting a receipt fetch for a hash that already has one running.
	#[serde(default = "default_dedupe_in_flight")]
	pub dedupe_in_flight: bool,
	/// Capacity of the broadcast event bus.
	#[serde(default = "default_event_bus_capacity")]
	pub event_bus_capacity: usize,
}

fn default_receipt_timeout_seconds() -> u64 {
	180
}

fn default_receipt_poll_interval_ms() -> u64 {
	4_000
}

fn default_dedupe_in_flight() -> bool {
	true
}

fn default_event_bus_capacity() -> usize {
	1_000
}

/// Product feature gating for networks.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeaturesConfig {
	/// Networks on which sending is enabled.
	#[serde(default)]
	pub send_network_ids: Vec<NetworkId>,
	/// Networks on which swapping is enabled.
	#[serde(default)]
	pub swap_network_ids: Vec<NetworkId>,
}

/// Configuration for the transaction store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of storage implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable and
/// supports defaults with `${VAR_NAME:-default_value}`.
///
/// Input is limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Token metadata from every network section.
	pub fn tokens(&self) -> Vec<TokenInfo> {
		self.networks
			.iter()
			.flat_map(|(network_id, network)| {
				network
					.tokens
					.iter()
					.map(move |token| token.to_token_info(*network_id))
			})
			.collect()
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.watcher.id.is_empty() {
			return Err(ConfigError::Validation("Watcher ID cannot be empty".into()));
		}
		if self.watcher.receipt_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"receipt_timeout_seconds must be greater than 0".into(),
			));
		}
		if self.watcher.receipt_poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"receipt_poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.watcher.event_bus_capacity == 0 {
			return Err(ConfigError::Validation(
				"event_bus_capacity must be greater than 0".into(),
			));
		}

		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}
		for (network_id, network) in &self.networks {
			if network.rpc_url.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have an rpc_url",
					network_id
				)));
			}
			let mut seen = HashSet::new();
			for token in &network.tokens {
				if !seen.insert(token.token_id.as_str()) {
					return Err(ConfigError::Validation(format!(
						"Token {} is configured twice on network {}",
						token.token_id, network_id
					)));
				}
			}
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' has no matching implementation section",
				self.storage.primary
			)));
		}

		Ok(())
	}
}

/// Parses and validates configuration from a TOML string.
///
/// Environment variables are resolved before parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
