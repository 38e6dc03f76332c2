use crate::{Crs, Extent, KeyBounds, Layout};

/// The cell type a layer declares, per §6. Elevation layers are always
/// `Float64`; the engine's output visibility layer always declares
/// `IntegerWithNodata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
	Float64,
	IntegerWithNodata,
}

/// Metadata shared by an elevation layer and the visibility layer derived
/// from it (§3, §6): `{layout, crs, extent, bounds}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
	pub cell_type: CellType,
	pub layout: Layout,
	pub crs: Crs,
	pub extent: Extent,
	pub bounds: KeyBounds,
}

impl Metadata {
	pub fn new(cell_type: CellType, layout: Layout, crs: Crs, extent: Extent, bounds: KeyBounds) -> anyhow::Result<Self> {
		let layout_bounds = layout.key_bounds();
		anyhow::ensure!(
			layout_bounds.contains(bounds.min_key) && layout_bounds.contains(bounds.max_key),
			crate::ViewshedError::InvalidLayer(format!(
				"bounds {bounds:?} exceed layout's own key range {layout_bounds:?}"
			))
		);
		Ok(Metadata { cell_type, layout, crs, extent, bounds })
	}

	/// Metadata for the output visibility layer: identical to `self` except
	/// for the declared cell type (§6: "Output inherits layout, extent,
	/// crs, bounds and declares integer-with-nodata cell type").
	#[must_use]
	pub fn as_visibility_metadata(&self) -> Metadata {
		Metadata { cell_type: CellType::IntegerWithNodata, ..self.clone() }
	}

	/// Re-run every invariant the validating constructors enforce, for a
	/// value that arrived by a path that skips them — namely
	/// `serde::Deserialize` on the public fields directly, the shape
	/// `DirectoryLayerIo::read` reads a `metadata.json` into. A corrupted or
	/// hand-edited file must fail here with `InvalidLayer`, not panic later
	/// in `key_bounds`/`resolution.rs`.
	pub fn revalidate(self) -> anyhow::Result<Self> {
		let layout = Layout::new(self.layout.tile_cols, self.layout.tile_rows, self.layout.total_cols, self.layout.total_rows)?;
		let extent = Extent::new(self.extent.xmin, self.extent.ymin, self.extent.xmax, self.extent.ymax)?;
		let bounds = KeyBounds::new(self.bounds.min_key, self.bounds.max_key)
			.ok_or_else(|| crate::ViewshedError::InvalidLayer(format!("bounds {:?} min/max inverted", self.bounds)))?;
		Metadata::new(self.cell_type, layout, self.crs, extent, bounds)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::TileKey;

	#[test]
	fn bounds_must_fit_inside_layout() {
		let layout = Layout::new(256, 256, 512, 512).unwrap();
		let extent = Extent::new(0.0, 0.0, 512.0, 512.0).unwrap();
		let out_of_range = KeyBounds::new(TileKey::new(0, 0), TileKey::new(5, 5)).unwrap();
		assert!(Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, out_of_range).is_err());
	}

	#[test]
	fn revalidate_catches_a_corrupted_layout() {
		let layout = Layout::new(256, 256, 512, 512).unwrap();
		let extent = Extent::new(0.0, 0.0, 512.0, 512.0).unwrap();
		let bounds = layout.key_bounds();
		let mut meta = Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, bounds).unwrap();
		meta.layout.total_cols = 0;
		assert!(meta.revalidate().is_err());
	}

	#[test]
	fn revalidate_accepts_a_well_formed_value() {
		let layout = Layout::new(256, 256, 512, 512).unwrap();
		let extent = Extent::new(0.0, 0.0, 512.0, 512.0).unwrap();
		let bounds = layout.key_bounds();
		let meta = Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, bounds).unwrap();
		assert_eq!(meta.clone().revalidate().unwrap(), meta);
	}

	#[test]
	fn visibility_metadata_preserves_geometry() {
		let layout = Layout::new(256, 256, 512, 512).unwrap();
		let extent = Extent::new(0.0, 0.0, 512.0, 512.0).unwrap();
		let bounds = layout.key_bounds();
		let meta = Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, bounds).unwrap();
		let visibility = meta.as_visibility_metadata();
		assert_eq!(visibility.cell_type, CellType::IntegerWithNodata);
		assert_eq!(visibility.layout, meta.layout);
		assert_eq!(visibility.extent, meta.extent);
		assert_eq!(visibility.bounds, meta.bounds);
	}
}
