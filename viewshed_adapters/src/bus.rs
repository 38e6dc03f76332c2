use dashmap::DashMap;
use viewshed_core::{Message, TileKey};

/// Concrete Ray Packet Bus (component D, §4.D), backed by a
/// [`dashmap::DashMap`] keyed by target tile — lower contention than a
/// single `Mutex<Vec<Message>>` since concurrent tile tasks almost never
/// address the same target.
///
/// `add` is safe under concurrent callers; `value`/`reset` are called only
/// by the driver between iterations (§4.D).
#[derive(Debug, Default)]
pub struct RayBus {
	packets: DashMap<TileKey, Vec<Message>>,
}

impl RayBus {
	#[must_use]
	pub fn new() -> Self {
		RayBus { packets: DashMap::new() }
	}

	/// Append one message. Concurrency-safe under many simultaneous tile
	/// tasks (§4.D contract).
	pub fn add(&self, message: Message) {
		self.packets.entry(message.target_key).or_default().push(message);
	}

	/// All messages added since the last `reset`, grouped by target key.
	/// Order across and within groups is unspecified (§4.D: "need not
	/// preserve insertion order").
	#[must_use]
	pub fn value(&self) -> Vec<Message> {
		self.packets.iter().flat_map(|entry| entry.value().clone()).collect()
	}

	/// Clear the buffer. Called only by the driver between iterations.
	pub fn reset(&self) {
		self.packets.clear();
	}

	/// Combine another bus's pending messages into this one, required when
	/// the runtime partitions accumulator state across workers (§4.D).
	pub fn merge(&self, other: &RayBus) {
		for entry in other.packets.iter() {
			self.packets.entry(*entry.key()).or_default().extend(entry.value().iter().cloned());
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.packets.is_empty()
	}
}
