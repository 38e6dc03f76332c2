use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use viewshed_core::TileKey;

/// Concrete `PartitionedDataset<K, V>` (§4.F), backed by a `DashMap` keyed
/// by [`TileKey`]. `map`/`flat_map` fan out onto bounded-concurrency tokio
/// tasks, the same I/O-vs-CPU split [`crate::ConcurrencyLimits`] names.
pub struct PartitionedDataset<V> {
	data: DashMap<TileKey, V>,
}

impl<V: Clone + Send + Sync + 'static> PartitionedDataset<V> {
	#[must_use]
	pub fn new(data: HashMap<TileKey, V>) -> Self {
		PartitionedDataset { data: data.into_iter().collect() }
	}

	#[must_use]
	pub fn get(&self, key: TileKey) -> Option<V> {
		self.data.get(&key).map(|entry| entry.value().clone())
	}

	pub fn insert(&self, key: TileKey, value: V) {
		self.data.insert(key, value);
	}

	#[must_use]
	pub fn keys(&self) -> Vec<TileKey> {
		self.data.iter().map(|entry| *entry.key()).collect()
	}

	#[must_use]
	pub fn count(&self) -> usize {
		self.data.len()
	}

	#[must_use]
	pub fn first(&self) -> Option<(TileKey, V)> {
		self.data.iter().next().map(|entry| (*entry.key(), entry.value().clone()))
	}

	/// Apply `f` to every partition, at most `concurrency` in flight (§4.F
	/// `map`).
	///
	/// # Panics
	/// If a spawned task panics.
	pub async fn map<F, R>(&self, concurrency: usize, f: F) -> PartitionedDataset<R>
	where
		F: Fn(TileKey, V) -> R + Send + Sync + 'static,
		R: Clone + Send + Sync + 'static,
	{
		let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
		let f = Arc::new(f);
		let mut handles = Vec::with_capacity(self.data.len());
		for entry in &self.data {
			let key = *entry.key();
			let value = entry.value().clone();
			let semaphore = semaphore.clone();
			let f = f.clone();
			handles.push(tokio::spawn(async move {
				let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
				(key, f(key, value))
			}));
		}
		let mut out = HashMap::with_capacity(handles.len());
		for handle in handles {
			let (key, result) = handle.await.expect("partition task panicked");
			out.insert(key, result);
		}
		PartitionedDataset::new(out)
	}

	/// Like [`Self::map`], but `f` may return zero or more results per
	/// partition, flattened into one `Vec` (§4.F `flatMap`).
	///
	/// # Panics
	/// If a spawned task panics.
	pub async fn flat_map<F, R>(&self, concurrency: usize, f: F) -> Vec<(TileKey, R)>
	where
		F: Fn(TileKey, V) -> Vec<R> + Send + Sync + 'static,
		R: Send + 'static,
	{
		let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
		let f = Arc::new(f);
		let mut handles = Vec::with_capacity(self.data.len());
		for entry in &self.data {
			let key = *entry.key();
			let value = entry.value().clone();
			let semaphore = semaphore.clone();
			let f = f.clone();
			handles.push(tokio::spawn(async move {
				let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
				(key, f(key, value))
			}));
		}
		let mut out = Vec::new();
		for handle in handles {
			let (key, results) = handle.await.expect("partition task panicked");
			out.extend(results.into_iter().map(|r| (key, r)));
		}
		out
	}

	#[must_use]
	pub fn into_inner(self) -> HashMap<TileKey, V> {
		self.data.into_iter().collect()
	}
}
