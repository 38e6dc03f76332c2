use crate::Operator;

/// Sentinel written at every cell before any ray pass has touched it
/// (§3 "Cells are initialized to a sentinel 'no information' value").
pub const VISIBILITY_NO_INFO: f64 = f64::NAN;

/// A dense, mutable grid of per-pixel visibility aggregates, owned
/// exclusively by the task currently operating on it (§5).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibilityTile {
	cols: u32,
	rows: u32,
	data: Vec<f64>,
}

impl VisibilityTile {
	#[must_use]
	pub fn empty(cols: u32, rows: u32) -> Self {
		VisibilityTile { cols, rows, data: vec![VISIBILITY_NO_INFO; (cols as usize) * (rows as usize)] }
	}

	/// Reconstruct a tile from previously persisted row-major data (§4.F
	/// directory-backed `LayerReader`).
	///
	/// # Panics
	/// If `data.len() != cols * rows`.
	#[must_use]
	pub fn from_raw(cols: u32, rows: u32, data: Vec<f64>) -> Self {
		assert_eq!(data.len(), (cols as usize) * (rows as usize), "visibility tile data length does not match {cols}x{rows}");
		VisibilityTile { cols, rows, data }
	}

	/// Raw row-major cell data, for adapters that persist the grid directly.
	#[must_use]
	pub fn data(&self) -> &[f64] {
		&self.data
	}

	#[must_use]
	pub fn cols(&self) -> u32 {
		self.cols
	}

	#[must_use]
	pub fn rows(&self) -> u32 {
		self.rows
	}

	fn index(&self, col: u32, row: u32) -> Option<usize> {
		if col >= self.cols || row >= self.rows {
			None
		} else {
			Some((row as usize) * (self.cols as usize) + (col as usize))
		}
	}

	/// Raw cell value, or `None` if `(col, row)` is out of range. A `Some`
	/// result may still be the [`VISIBILITY_NO_INFO`] sentinel.
	#[must_use]
	pub fn get_raw(&self, col: u32, row: u32) -> Option<f64> {
		self.index(col, row).map(|i| self.data[i])
	}

	/// Whether the cell has received any ray pass at all.
	#[must_use]
	pub fn has_info(&self, col: u32, row: u32) -> bool {
		self.get_raw(col, row).is_some_and(|v| !v.is_nan())
	}

	/// Apply `operator` at `(col, row)` against `incoming`, the verdict
	/// from the current ray pass (§4.C step 3). No-op if out of range.
	pub fn apply(&mut self, col: u32, row: u32, incoming: f64, operator: Operator) {
		let Some(idx) = self.index(col, row) else { return };
		let current = self.data[idx];
		let prior = if current.is_nan() { None } else { Some(current) };
		self.data[idx] = operator.combine(prior, incoming);
	}

	/// Cell-wise logical OR of two visibility tiles of equal shape, used to
	/// check the "two observers" equivalence of §8 scenario 4.
	///
	/// # Panics
	/// If `self` and `other` differ in shape.
	#[must_use]
	pub fn or_with(&self, other: &VisibilityTile) -> VisibilityTile {
		assert_eq!((self.cols, self.rows), (other.cols, other.rows));
		let data = self
			.data
			.iter()
			.zip(&other.data)
			.map(|(&a, &b)| match (a.is_nan(), b.is_nan()) {
				(true, true) => VISIBILITY_NO_INFO,
				(true, false) => b,
				(false, true) => a,
				(false, false) => f64::from((a != 0.0) || (b != 0.0)),
			})
			.collect();
		VisibilityTile { cols: self.cols, rows: self.rows, data }
	}

	/// Count of cells with `has_info` true and a nonzero (truthy) value.
	#[must_use]
	pub fn visible_count(&self) -> usize {
		self.data.iter().filter(|v| !v.is_nan() && **v != 0.0).count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_tile_has_no_info() {
		let tile = VisibilityTile::empty(2, 2);
		assert!(!tile.has_info(0, 0));
		assert_eq!(tile.visible_count(), 0);
	}

	#[test]
	fn apply_or_accumulates() {
		let mut tile = VisibilityTile::empty(1, 1);
		tile.apply(0, 0, 0.0, Operator::Or);
		assert!(tile.has_info(0, 0));
		assert_eq!(tile.get_raw(0, 0), Some(0.0));
		tile.apply(0, 0, 1.0, Operator::Or);
		assert_eq!(tile.get_raw(0, 0), Some(1.0));
		// further OR passes must not flip it back off (idempotent/commutative).
		tile.apply(0, 0, 0.0, Operator::Or);
		assert_eq!(tile.get_raw(0, 0), Some(1.0));
	}

	#[test]
	fn or_with_merges_disjoint_visibility() {
		let mut a = VisibilityTile::empty(2, 1);
		a.apply(0, 0, 1.0, Operator::Or);
		let mut b = VisibilityTile::empty(2, 1);
		b.apply(1, 0, 1.0, Operator::Or);
		let merged = a.or_with(&b);
		assert_eq!(merged.visible_count(), 2);
	}

	#[test]
	fn apply_out_of_range_is_noop() {
		let mut tile = VisibilityTile::empty(1, 1);
		tile.apply(5, 5, 1.0, Operator::Or);
		assert!(!tile.has_info(0, 0));
	}
}
