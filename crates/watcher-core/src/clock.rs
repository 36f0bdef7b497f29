//! Polling cadence per network.
//!
//! Each watch loop sleeps for roughly one block time between cycles. The
//! interval never drops below [`MIN_POLLING_INTERVAL`], whatever the chain's
//! block time or the configured override says.

use std::time::Duration;
use watcher_types::Network;

/// Global floor for the watch loop interval.
pub const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(2_000);

/// Returns the sleep between polling cycles for `network`.
///
/// `configured_ms` replaces the chain's average block time when set.
pub fn polling_interval(network: Network, configured_ms: Option<u64>) -> Duration {
	let ms = configured_ms.unwrap_or_else(|| network.average_block_time_ms());
	Duration::from_millis(ms).max(MIN_POLLING_INTERVAL)
}
