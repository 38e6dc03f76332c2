/// A dense, immutable grid of elevation samples in meters (§3).
///
/// Elevation tiles never mutate once constructed: the kernel only ever
/// reads from them while writing into a paired [`crate::VisibilityTile`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevationTile {
	cols: u32,
	rows: u32,
	data: Vec<f64>,
}

impl ElevationTile {
	/// # Panics
	/// If `data.len() != cols * rows`.
	#[must_use]
	pub fn new(cols: u32, rows: u32, data: Vec<f64>) -> Self {
		assert_eq!(
			data.len(),
			(cols as usize) * (rows as usize),
			"elevation tile data length does not match {cols}x{rows}"
		);
		ElevationTile { cols, rows, data }
	}

	/// A flat tile of a single elevation value, useful for synthetic test
	/// layers (§8 scenario 1/2).
	#[must_use]
	pub fn flat(cols: u32, rows: u32, elevation_m: f64) -> Self {
		ElevationTile::new(cols, rows, vec![elevation_m; (cols as usize) * (rows as usize)])
	}

	#[must_use]
	pub fn cols(&self) -> u32 {
		self.cols
	}

	#[must_use]
	pub fn rows(&self) -> u32 {
		self.rows
	}

	/// Elevation at `(col, row)`, or `None` if outside the tile.
	#[must_use]
	pub fn get(&self, col: i64, row: i64) -> Option<f64> {
		if col < 0 || row < 0 || col >= i64::from(self.cols) || row >= i64::from(self.rows) {
			return None;
		}
		#[allow(clippy::cast_sign_loss)]
		self.data.get((row as usize) * (self.cols as usize) + (col as usize)).copied()
	}

	/// Raw row-major cell data, for adapters that persist the grid directly
	/// (§4.F directory-backed `LayerReader`/`LayerWriter`).
	#[must_use]
	pub fn data(&self) -> &[f64] {
		&self.data
	}

	/// Set the elevation at `(col, row)`. Used only by test layer builders.
	///
	/// # Panics
	/// If `(col, row)` is outside the tile.
	pub fn set(&mut self, col: u32, row: u32, elevation_m: f64) {
		let idx = (row as usize) * (self.cols as usize) + (col as usize);
		self.data[idx] = elevation_m;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flat_tile_reads_uniform_elevation() {
		let tile = ElevationTile::flat(4, 3, 10.0);
		assert_eq!(tile.get(0, 0), Some(10.0));
		assert_eq!(tile.get(3, 2), Some(10.0));
	}

	#[test]
	fn get_out_of_bounds_is_none() {
		let tile = ElevationTile::flat(4, 3, 0.0);
		assert_eq!(tile.get(-1, 0), None);
		assert_eq!(tile.get(4, 0), None);
		assert_eq!(tile.get(0, 3), None);
	}

	#[test]
	fn set_mutates_single_cell() {
		let mut tile = ElevationTile::flat(2, 2, 0.0);
		tile.set(1, 0, 1000.0);
		assert_eq!(tile.get(1, 0), Some(1000.0));
		assert_eq!(tile.get(0, 0), Some(0.0));
	}
}
