use crate::{Metadata, TileKey};
use std::collections::HashMap;

/// A mapping from [`TileKey`] to a tile payload, plus shared [`Metadata`]
/// (§3). Used both for the read-only elevation layer (`Layer<ElevationTile>`)
/// and the output visibility layer (`Layer<VisibilityTile>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
	metadata: Metadata,
	tiles: HashMap<TileKey, T>,
}

impl<T> Layer<T> {
	/// Build a layer, validating that `tiles`'s key set is exactly the
	/// rectangle `metadata.bounds` describes (§4.A error: `InvalidLayer` if
	/// `bounds` is not well-formed, here extended to "tiles don't cover
	/// bounds exactly").
	pub fn new(metadata: Metadata, tiles: HashMap<TileKey, T>) -> anyhow::Result<Self> {
		anyhow::ensure!(
			!tiles.is_empty(),
			crate::ViewshedError::InvalidLayer("layer has no tiles".into())
		);
		for key in metadata.bounds.iter() {
			anyhow::ensure!(
				tiles.contains_key(&key),
				crate::ViewshedError::InvalidLayer(format!("tile {key} declared in bounds is missing"))
			);
		}
		anyhow::ensure!(
			tiles.len() == (metadata.bounds.cols() * metadata.bounds.rows()) as usize,
			crate::ViewshedError::InvalidLayer("layer has tiles outside its declared bounds".into())
		);
		Ok(Layer { metadata, tiles })
	}

	#[must_use]
	pub fn metadata(&self) -> &Metadata {
		&self.metadata
	}

	#[must_use]
	pub fn get(&self, key: TileKey) -> Option<&T> {
		self.tiles.get(&key)
	}

	pub fn get_mut(&mut self, key: TileKey) -> Option<&mut T> {
		self.tiles.get_mut(&key)
	}

	pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
		self.tiles.keys().copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (TileKey, &T)> {
		self.tiles.iter().map(|(&k, v)| (k, v))
	}

	#[must_use]
	pub fn into_inner(self) -> (Metadata, HashMap<TileKey, T>) {
		(self.metadata, self.tiles)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.tiles.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}
}
