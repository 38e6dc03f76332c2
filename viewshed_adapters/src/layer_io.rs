use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use viewshed_core::{ElevationTile, Layer, Metadata, TileKey, VisibilityTile, ViewshedError};

/// Load a `(TileKey → Tile)` layer with its metadata (§4.F). Used only at
/// the boundaries of a run, never inside the iteration loop.
#[async_trait]
pub trait LayerReader<T>: Send + Sync {
	async fn read(&self) -> anyhow::Result<Layer<T>>;
}

/// Store a `(TileKey → Tile)` layer with its metadata (§4.F).
#[async_trait]
pub trait LayerWriter<T>: Send + Sync {
	async fn write(&self, layer: &Layer<T>) -> anyhow::Result<()>;
}

/// An in-memory reader, for tests and for chaining engine runs without
/// touching disk.
pub struct InMemoryLayerReader<T> {
	layer: Layer<T>,
}

impl<T> InMemoryLayerReader<T> {
	#[must_use]
	pub fn new(layer: Layer<T>) -> Self {
		InMemoryLayerReader { layer }
	}
}

#[async_trait]
impl<T: Clone + Send + Sync> LayerReader<T> for InMemoryLayerReader<T> {
	async fn read(&self) -> anyhow::Result<Layer<T>> {
		Ok(self.layer.clone())
	}
}

/// An in-memory writer that captures the last layer written, for tests.
#[derive(Default)]
pub struct InMemoryLayerWriter<T> {
	written: parking_lot::Mutex<Option<Layer<T>>>,
}

impl<T: Clone> InMemoryLayerWriter<T> {
	#[must_use]
	pub fn new() -> Self {
		InMemoryLayerWriter { written: parking_lot::Mutex::new(None) }
	}

	#[must_use]
	pub fn written(&self) -> Option<Layer<T>> {
		self.written.lock().clone()
	}
}

#[async_trait]
impl<T: Clone + Send + Sync> LayerWriter<T> for InMemoryLayerWriter<T> {
	async fn write(&self, layer: &Layer<T>) -> anyhow::Result<()> {
		*self.written.lock() = Some(layer.clone());
		Ok(())
	}
}

/// Bridges [`ElevationTile`]/[`VisibilityTile`] to the directory-backed
/// adapter's raw-grid-plus-sidecar persistence, without duplicating the
/// read/write logic per tile type.
trait RawGrid: Sized {
	fn dims(&self) -> (u32, u32);
	fn raw(&self) -> &[f64];
	fn from_raw(cols: u32, rows: u32, data: Vec<f64>) -> Self;
}

impl RawGrid for ElevationTile {
	fn dims(&self) -> (u32, u32) {
		(self.cols(), self.rows())
	}
	fn raw(&self) -> &[f64] {
		self.data()
	}
	fn from_raw(cols: u32, rows: u32, data: Vec<f64>) -> Self {
		ElevationTile::new(cols, rows, data)
	}
}

impl RawGrid for VisibilityTile {
	fn dims(&self) -> (u32, u32) {
		(self.cols(), self.rows())
	}
	fn raw(&self) -> &[f64] {
		self.data()
	}
	fn from_raw(cols: u32, rows: u32, data: Vec<f64>) -> Self {
		VisibilityTile::from_raw(cols, rows, data)
	}
}

#[derive(Serialize, Deserialize)]
struct TileSidecar {
	cols: u32,
	rows: u32,
}

/// Directory-backed `LayerReader`/`LayerWriter` (§4.F): one `metadata.json`
/// for the layer, and per tile one flat little-endian `f64` `.grid` file
/// plus a small `.json` sidecar recording its pixel dimensions.
///
/// Each tile's own read/write is a blocking `std::fs` call, but tiles are
/// fanned out across the [`PartitionedDataset`] abstraction at
/// [`ConcurrencyLimits::detect`]'s `io` bound, the same I/O-bound adapter
/// concern §4.F assigns it (distinct from the CPU-bound kernel fan-out in
/// the engine driver, which uses `futures::stream::buffer_unordered`
/// directly per §5).
pub struct DirectoryLayerIo {
	dir: PathBuf,
}

impl DirectoryLayerIo {
	#[must_use]
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		DirectoryLayerIo { dir: dir.into() }
	}

	fn metadata_path(&self) -> PathBuf {
		self.dir.join("metadata.json")
	}
}

fn grid_path(dir: &std::path::Path, key: TileKey) -> PathBuf {
	dir.join(format!("{}_{}.grid", key.col, key.row))
}

fn sidecar_path(dir: &std::path::Path, key: TileKey) -> PathBuf {
	dir.join(format!("{}_{}.json", key.col, key.row))
}

fn read_tile_blocking<T: RawGrid>(dir: &std::path::Path, key: TileKey) -> anyhow::Result<T> {
	let sidecar_bytes = std::fs::read(sidecar_path(dir, key))?;
	let sidecar: TileSidecar = serde_json::from_slice(&sidecar_bytes)?;
	let grid_bytes = std::fs::read(grid_path(dir, key))?;
	let data = bytes_to_f64(&grid_bytes)?;
	Ok(T::from_raw(sidecar.cols, sidecar.rows, data))
}

fn write_tile_blocking<T: RawGrid>(dir: &std::path::Path, key: TileKey, tile: &T) -> anyhow::Result<()> {
	let (cols, rows) = tile.dims();
	std::fs::write(sidecar_path(dir, key), serde_json::to_vec(&TileSidecar { cols, rows })?)?;
	std::fs::write(grid_path(dir, key), f64_to_bytes(tile.raw()))?;
	Ok(())
}

#[async_trait]
impl<T: RawGrid + Clone + Send + Sync + 'static> LayerReader<T> for DirectoryLayerIo {
	async fn read(&self) -> anyhow::Result<Layer<T>> {
		let metadata_bytes = std::fs::read(self.metadata_path())?;
		let metadata: Metadata = serde_json::from_slice(&metadata_bytes)?;
		let metadata = metadata.revalidate()?;

		let placeholders: HashMap<TileKey, ()> = metadata.bounds.iter().map(|key| (key, ())).collect();
		let dataset = crate::PartitionedDataset::new(placeholders);
		let dir = self.dir.clone();
		let concurrency = crate::ConcurrencyLimits::detect().io;
		let loaded = dataset.map(concurrency, move |key, ()| read_tile_blocking::<T>(&dir, key).map_err(|e| e.to_string())).await;

		let mut tiles = HashMap::with_capacity(loaded.count());
		for key in loaded.keys() {
			let tile = loaded.get(key).expect("key was collected from this dataset's own keys");
			tiles.insert(key, tile.map_err(|message| ViewshedError::InvalidLayer(format!("tile {key}: {message}")))?);
		}
		Layer::new(metadata, tiles)
	}
}

#[async_trait]
impl<T: RawGrid + Clone + Send + Sync + 'static> LayerWriter<T> for DirectoryLayerIo {
	async fn write(&self, layer: &Layer<T>) -> anyhow::Result<()> {
		std::fs::create_dir_all(&self.dir)?;
		std::fs::write(self.metadata_path(), serde_json::to_vec_pretty(layer.metadata())?)?;

		let tiles: HashMap<TileKey, T> = layer.iter().map(|(key, tile)| (key, tile.clone())).collect();
		let dataset = crate::PartitionedDataset::new(tiles);
		let dir = self.dir.clone();
		let concurrency = crate::ConcurrencyLimits::detect().io;
		let written = dataset.map(concurrency, move |key, tile| write_tile_blocking(&dir, key, &tile).map_err(|e| e.to_string())).await;

		for key in written.keys() {
			let result = written.get(key).expect("key was collected from this dataset's own keys");
			result.map_err(|message| ViewshedError::InvalidLayer(format!("tile {key}: {message}")))?;
		}
		Ok(())
	}
}

fn f64_to_bytes(data: &[f64]) -> Vec<u8> {
	let mut bytes = Vec::with_capacity(data.len() * 8);
	for value in data {
		bytes.extend_from_slice(&value.to_le_bytes());
	}
	bytes
}

fn bytes_to_f64(bytes: &[u8]) -> anyhow::Result<Vec<f64>> {
	anyhow::ensure!(
		bytes.len() % 8 == 0,
		ViewshedError::InvalidLayer("grid file length is not a multiple of 8 bytes".into())
	);
	Ok(bytes
		.chunks_exact(8)
		.map(|chunk| f64::from_le_bytes(chunk.try_into().expect("chunk is exactly 8 bytes")))
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use viewshed_core::{CellType, Crs, Extent, Layout};

	fn metadata() -> Metadata {
		let layout = Layout::new(2, 2, 4, 4).unwrap();
		let extent = Extent::new(0.0, 0.0, 4.0, 4.0).unwrap();
		Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, layout.key_bounds()).unwrap()
	}

	fn elevation_layer() -> Layer<ElevationTile> {
		let metadata = metadata();
		let mut tiles = HashMap::new();
		for key in metadata.bounds.iter() {
			tiles.insert(key, ElevationTile::flat(2, 2, (key.col * 10 + key.row) as f64));
		}
		Layer::new(metadata, tiles).unwrap()
	}

	#[tokio::test]
	async fn in_memory_reader_returns_what_it_was_built_with() {
		let layer = elevation_layer();
		let reader = InMemoryLayerReader::new(layer.clone());
		let round_tripped = reader.read().await.unwrap();
		assert_eq!(round_tripped, layer);
	}

	#[tokio::test]
	async fn in_memory_writer_captures_the_layer() {
		let layer = elevation_layer();
		let writer: InMemoryLayerWriter<ElevationTile> = InMemoryLayerWriter::new();
		writer.write(&layer).await.unwrap();
		assert_eq!(writer.written(), Some(layer));
	}

	#[tokio::test]
	async fn directory_round_trips_an_elevation_layer() {
		let dir = tempfile::tempdir().unwrap();
		let io = DirectoryLayerIo::new(dir.path());
		let layer = elevation_layer();
		io.write(&layer).await.unwrap();
		let round_tripped: Layer<ElevationTile> = io.read().await.unwrap();
		assert_eq!(round_tripped, layer);
	}

	#[test]
	fn grid_byte_round_trip_preserves_values() {
		let data = vec![1.5, -2.25, f64::NAN, 0.0];
		let bytes = f64_to_bytes(&data);
		let back = bytes_to_f64(&bytes).unwrap();
		assert_eq!(back.len(), data.len());
		assert_eq!(back[0], data[0]);
		assert_eq!(back[1], data[1]);
		assert!(back[2].is_nan());
	}

	#[test]
	fn malformed_grid_bytes_are_rejected() {
		assert!(bytes_to_f64(&[0u8; 5]).is_err());
	}

	#[tokio::test]
	async fn a_hand_corrupted_metadata_json_fails_cleanly_instead_of_panicking() {
		let dir = tempfile::tempdir().unwrap();
		let io = DirectoryLayerIo::new(dir.path());
		io.write(&elevation_layer()).await.unwrap();

		// Simulate a hand-edited/corrupted metadata.json: a layout whose
		// total size isn't a multiple of its tile size, bypassing the
		// in-process validating constructors entirely.
		let mut metadata = metadata();
		metadata.layout.total_cols = 3;
		std::fs::write(dir.path().join("metadata.json"), serde_json::to_vec(&metadata).unwrap()).unwrap();

		let result: anyhow::Result<Layer<ElevationTile>> = io.read().await;
		assert!(result.is_err(), "a metadata.json whose layout fails validation must surface InvalidLayer, not panic");
	}
}
