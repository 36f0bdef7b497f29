//! Polling loop for one network.
//!
//! Each cycle reads the pending transactions from the store and starts one
//! receipt fetch per transaction on this network, without waiting for them.
//! Fetches run on a task set owned by the loop, so dropping or aborting the
//! loop cancels every fetch it started.

use crate::fetcher::ReceiptFetcher;
use crate::WatcherError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use watcher_storage::TransactionStore;
use watcher_types::NetworkId;

pub struct NetworkWatchLoop {
	network_id: NetworkId,
	interval: Duration,
	store: Arc<dyn TransactionStore>,
	fetcher: Arc<ReceiptFetcher>,
	fetches: JoinSet<()>,
}

impl NetworkWatchLoop {
	pub fn new(
		network_id: NetworkId,
		interval: Duration,
		store: Arc<dyn TransactionStore>,
		fetcher: Arc<ReceiptFetcher>,
	) -> Self {
		Self {
			network_id,
			interval,
			store,
			fetcher,
			fetches: JoinSet::new(),
		}
	}

	pub fn network_id(&self) -> NetworkId {
		self.network_id
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Number of fetch tasks started by this loop that have not been reaped.
	pub fn active_fetches(&self) -> usize {
		self.fetches.len()
	}

	/// Runs a single polling cycle and returns how many fetches it started.
	pub async fn poll_once(&mut self) -> Result<usize, WatcherError> {
		self.reap_finished();

		let network_id = self.network_id;
		let pending = self.store.pending_transactions().await?;
		let mut started = 0;
		for transaction in pending
			.into_iter()
			.filter(|tx| tx.network_id == network_id && tx.transaction_hash.is_some())
		{
			let fetcher = Arc::clone(&self.fetcher);
			self.fetches.spawn(async move {
				fetcher.fetch_and_reconcile(&transaction, network_id).await;
			});
			started += 1;
		}

		if started > 0 {
			tracing::debug!(
				network_id = %self.network_id,
				started,
				active = self.fetches.len(),
				"Started receipt fetches"
			);
		}
		Ok(started)
	}

	/// Polls forever, sleeping `interval` between cycles.
	pub async fn run(mut self) {
		tracing::info!(
			network_id = %self.network_id,
			interval_ms = self.interval.as_millis() as u64,
			"Watching pending transactions"
		);

		loop {
			if let Err(e) = self.poll_once().await {
				tracing::warn!(
					network_id = %self.network_id,
					error = %e,
					"Failed to read pending transactions"
				);
			}
			tokio::time::sleep(self.interval).await;
		}
	}

	fn reap_finished(&mut self) {
		while let Some(result) = self.fetches.try_join_next() {
			if let Err(e) = result {
				if e.is_panic() {
					tracing::error!(
						network_id = %self.network_id,
						error = %e,
						"Receipt fetch task panicked"
					);
				}
			}
		}
	}
}
