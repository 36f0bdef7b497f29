//! Receipt fetching for a single pending transaction.
//!
//! A fetch waits for the receipt, hands it to the [`StatusReconciler`] and,
//! for successful swaps, emits a points event. Every failure is logged and
//! swallowed so that the transaction stays pending and is retried on a later
//! polling cycle.

use crate::event_bus::EventBus;
use crate::in_flight::InFlightRegistry;
use crate::reconciler::StatusReconciler;
use crate::WatcherError;
use std::sync::Arc;
use tracing::instrument;
use watcher_rpc::RpcService;
use watcher_types::{
	truncate_id, NetworkId, PointsActivity, PointsEvent, StandbyTransaction, TransactionHash,
	TransactionStatus, WatcherEvent,
};

pub struct ReceiptFetcher {
	rpc: Arc<RpcService>,
	reconciler: Arc<StatusReconciler>,
	event_bus: EventBus,
	in_flight: Option<InFlightRegistry>,
}

impl ReceiptFetcher {
	/// Creates a fetcher. With `in_flight` set, a hash already being waited on
	/// is not fetched a second time.
	pub fn new(
		rpc: Arc<RpcService>,
		reconciler: Arc<StatusReconciler>,
		event_bus: EventBus,
		in_flight: Option<InFlightRegistry>,
	) -> Self {
		Self {
			rpc,
			reconciler,
			event_bus,
			in_flight,
		}
	}

	/// Waits for the receipt of `transaction` on `network_id` and reconciles it.
	///
	/// Never fails: errors are logged and the transaction is left pending.
	#[instrument(skip_all, fields(tx_id = %truncate_id(transaction.id()), network_id = %network_id))]
	pub async fn fetch_and_reconcile(
		&self,
		transaction: &StandbyTransaction,
		network_id: NetworkId,
	) {
		let Some(hash) = transaction.transaction_hash.as_ref() else {
			tracing::debug!("No transaction hash, nothing to fetch");
			return;
		};

		// The destination leg of a cross-chain swap is tracked elsewhere.
		if transaction.kind.is_confirmed_cross_chain_source() {
			tracing::debug!(
				tx_hash = %truncate_id(&hash.to_hex()),
				"Source leg already confirmed, skipping"
			);
			return;
		}

		let _claim = match &self.in_flight {
			Some(registry) => match registry.try_claim(network_id, hash) {
				Some(guard) => Some(guard),
				None => {
					tracing::debug!(
						tx_hash = %truncate_id(&hash.to_hex()),
						"Receipt fetch already in flight"
					);
					return;
				},
			},
			None => None,
		};

		if let Err(e) = self.reconcile_receipt(transaction, hash, network_id).await {
			tracing::warn!(
				tx_hash = %truncate_id(&hash.to_hex()),
				error = %e,
				"Failed to fetch or reconcile receipt, will retry"
			);
		}
	}

	async fn reconcile_receipt(
		&self,
		transaction: &StandbyTransaction,
		hash: &TransactionHash,
		network_id: NetworkId,
	) -> Result<(), WatcherError> {
		let receipt = self.rpc.wait_for_transaction_receipt(network_id, hash).await?;
		let succeeded = receipt.status.is_success();

		let override_status = if transaction.kind.is_cross_chain_swap() && succeeded {
			Some(TransactionStatus::Pending)
		} else {
			None
		};

		self.reconciler
			.reconcile(
				transaction.id(),
				&receipt,
				network_id,
				transaction.fee_currency_id.as_deref(),
				override_status,
			)
			.await?;

		if succeeded {
			if let Some((from_token_id, to_token_id)) = transaction.kind.swap_token_ids() {
				self.event_bus.publish(WatcherEvent::Points(PointsEvent {
					activity_id: PointsActivity::Swap,
					transaction_hash: hash.clone(),
					network_id,
					from_token_id: from_token_id.to_string(),
					to_token_id: to_token_id.to_string(),
				}));
			}
		}

		Ok(())
	}
}
