use std::sync::Arc;

/// Concrete `Broadcast<T>` (§4.F): a one-writer, many-reader read-only
/// snapshot, consistent for the lifetime of one iteration. Backed by
/// `Arc<T>`, cloned cheaply into every tile task.
#[derive(Debug, Clone)]
pub struct Broadcast<T> {
	inner: Arc<T>,
}

impl<T> Broadcast<T> {
	#[must_use]
	pub fn new(value: T) -> Self {
		Broadcast { inner: Arc::new(value) }
	}

	#[must_use]
	pub fn get(&self) -> &T {
		&self.inner
	}
}

impl<T> std::ops::Deref for Broadcast<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.inner
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_the_same_snapshot() {
		let broadcast = Broadcast::new(vec![1, 2, 3]);
		let clone = broadcast.clone();
		assert_eq!(broadcast.get(), clone.get());
		assert!(Arc::ptr_eq(&broadcast.inner, &clone.inner));
	}
}
