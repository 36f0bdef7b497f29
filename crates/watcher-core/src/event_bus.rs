//! Broadcast event bus for watcher events.
//!
//! Publishing never blocks and never fails because nobody listens; consumers
//! that fall behind lose the oldest events.

use tokio::sync::broadcast;
use watcher_types::WatcherEvent;

/// Cloneable handle to the watcher's broadcast channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<WatcherEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<WatcherEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to current subscribers.
	///
	/// Returns the number of subscribers reached; zero when there are none.
	pub fn publish(&self, event: WatcherEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}
