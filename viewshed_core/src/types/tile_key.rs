use std::fmt;

/// `(col, row)` identifier of a tile within the layer grid.
///
/// Columns grow east, rows grow south, mirroring the raster convention used
/// throughout the layout and kernel components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileKey {
	pub col: i64,
	pub row: i64,
}

impl TileKey {
	#[must_use]
	pub fn new(col: i64, row: i64) -> Self {
		TileKey { col, row }
	}

	/// The neighbor a ray exiting `self` is addressed to, given the
	/// [`Direction`] label the *receiving* tile will see on the [`Message`](crate::Message)
	/// (i.e. the edge of the neighbor the ray enters through).
	///
	/// `FromWest` means the neighbor receives the ray across its west edge,
	/// so the neighbor lies to `self`'s east, and so on around the compass.
	#[must_use]
	pub fn neighbor(self, direction: crate::Direction) -> Option<TileKey> {
		use crate::Direction::{FromEast, FromInside, FromNorth, FromSouth, FromWest};
		match direction {
			FromSouth => Some(TileKey::new(self.col, self.row - 1)),
			FromNorth => Some(TileKey::new(self.col, self.row + 1)),
			FromWest => Some(TileKey::new(self.col + 1, self.row)),
			FromEast => Some(TileKey::new(self.col - 1, self.row)),
			FromInside => None,
		}
	}
}

impl fmt::Display for TileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.col, self.row)
	}
}

/// A well-defined rectangle of [`TileKey`]s: `minKey..=maxKey`.
///
/// [`crate::ViewshedError::InvalidLayer`] is raised whenever a layer's
/// key set does not form exactly this shape (§4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyBounds {
	pub min_key: TileKey,
	pub max_key: TileKey,
}

impl KeyBounds {
	#[must_use]
	pub fn new(min_key: TileKey, max_key: TileKey) -> Option<Self> {
		if min_key.col <= max_key.col && min_key.row <= max_key.row {
			Some(KeyBounds { min_key, max_key })
		} else {
			None
		}
	}

	#[must_use]
	pub fn contains(&self, key: TileKey) -> bool {
		(self.min_key.col..=self.max_key.col).contains(&key.col)
			&& (self.min_key.row..=self.max_key.row).contains(&key.row)
	}

	#[must_use]
	pub fn cols(&self) -> i64 {
		self.max_key.col - self.min_key.col + 1
	}

	#[must_use]
	pub fn rows(&self) -> i64 {
		self.max_key.row - self.min_key.row + 1
	}

	/// Every key in the rectangle, row-major.
	pub fn iter(&self) -> impl Iterator<Item = TileKey> + '_ {
		(self.min_key.row..=self.max_key.row)
			.flat_map(move |row| (self.min_key.col..=self.max_key.col).map(move |col| TileKey::new(col, row)))
	}

	/// Derive the tightest [`KeyBounds`] containing every key in `keys`,
	/// failing if the keys do not already form a full rectangle (§4.A).
	pub fn from_keys(keys: impl IntoIterator<Item = TileKey>) -> anyhow::Result<Self> {
		let mut iter = keys.into_iter();
		let first = iter
			.next()
			.ok_or_else(|| crate::ViewshedError::InvalidLayer("layer has no tiles".into()))?;
		let mut min_key = first;
		let mut max_key = first;
		let mut count = 1usize;
		for key in iter {
			min_key.col = min_key.col.min(key.col);
			min_key.row = min_key.row.min(key.row);
			max_key.col = max_key.col.max(key.col);
			max_key.row = max_key.row.max(key.row);
			count += 1;
		}
		let bounds = KeyBounds::new(min_key, max_key)
			.ok_or_else(|| crate::ViewshedError::InvalidLayer("bounds min/max inverted".into()))?;
		let expected = (bounds.cols() * bounds.rows()) as usize;
		if expected != count {
			anyhow::bail!(crate::ViewshedError::InvalidLayer(format!(
				"tile keys do not form a rectangle: expected {expected} tiles, found {count}"
			)));
		}
		Ok(bounds)
	}
}
