//! Entry point for the pending transaction watcher.
//!
//! Loads the configuration, wires the storage backend and the per-network
//! RPC clients, and runs the watcher until interrupted.

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use watcher_config::Config;
use watcher_core::{EventBus, WatcherBuilder, WatcherFactories};
use watcher_rpc::implementations::evm::alloy::create_rpc_clients;
use watcher_storage::implementations::file::create_storage as create_file_storage;
use watcher_storage::implementations::memory::create_storage as create_memory_storage;
use watcher_types::{truncate_id, WatcherEvent};

/// Command-line arguments for the watcher.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.watcher.id);

	let storage_factories = create_factory_map!(
		watcher_storage::TransactionStore,
		watcher_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let supervisor = WatcherBuilder::new(config).build(WatcherFactories {
		storage_factories,
		rpc_factory: create_rpc_clients,
	})?;

	let events = tokio::spawn(log_events(supervisor.event_bus().clone()));
	let watcher = supervisor.start();

	if watcher.networks().is_empty() {
		tracing::warn!("No networks to watch, check [features] and [networks]");
	}

	tokio::signal::ctrl_c().await?;
	tracing::info!("Shutdown signal received");

	watcher.shutdown().await;
	events.abort();

	tracing::info!("Stopped watcher");
	Ok(())
}

/// Logs every event published by the watcher.
async fn log_events(event_bus: EventBus) {
	let mut receiver = event_bus.subscribe();
	loop {
		match receiver.recv().await {
			Ok(WatcherEvent::ReceiptReconciled(update)) => {
				tracing::info!(
					tx_id = %truncate_id(&update.tx_id),
					tx_hash = %truncate_id(&update.transaction_hash.to_hex()),
					status = ?update.status,
					fees = update.fees.len(),
					"Receipt reconciled"
				);
			},
			Ok(WatcherEvent::Points(event)) => {
				tracing::info!(
					tx_hash = %truncate_id(&event.transaction_hash.to_hex()),
					network_id = %event.network_id,
					from = %event.from_token_id,
					to = %event.to_token_id,
					"Points activity recorded"
				);
			},
			Err(RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "Event listener lagged behind");
			},
			Err(RecvError::Closed) => break,
		}
	}
}
