use crate::{Direction, Ray, TileKey};

/// A packet emitted by the kernel at a tile boundary, addressed to the
/// neighbor across `direction` (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
	pub target_key: TileKey,
	pub causal_observer_index: usize,
	pub direction: Direction,
	pub rays: Vec<Ray>,
}

impl Message {
	#[must_use]
	pub fn new(target_key: TileKey, causal_observer_index: usize, direction: Direction, rays: Vec<Ray>) -> Self {
		Message { target_key, causal_observer_index, direction, rays }
	}
}
