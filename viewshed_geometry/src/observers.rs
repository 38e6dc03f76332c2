use std::collections::HashMap;
use viewshed_core::{ElevationTile, Layer, Metadata, Point6D, PointInfo, TileKey, ViewshedError};

/// Component B, step 1-3: elaborate a single observer against layer
/// metadata (§4.B).
pub fn resolve_point(metadata: &Metadata, index: usize, point: &Point6D) -> anyhow::Result<PointInfo> {
	let (key, col, row) = metadata
		.layout
		.locate(&metadata.extent, point.x, point.y)
		.filter(|(key, _, _)| metadata.bounds.contains(*key))
		.ok_or(ViewshedError::ObserverOutOfLayout { index, x: point.x, y: point.y })?;

	Ok(PointInfo {
		index,
		key,
		col,
		row,
		view_height: point.view_height,
		angle: point.angle,
		fov: point.field_of_view,
		alt: point.altitude,
	})
}

/// Component B, step 3 onward: elaborate every observer and assemble the
/// three broadcast tables the driver needs (§4.B).
#[derive(Debug, Clone)]
pub struct ObserverTables {
	by_key: HashMap<TileKey, Vec<PointInfo>>,
	by_index: HashMap<usize, PointInfo>,
	heights: HashMap<usize, f64>,
}

impl ObserverTables {
	/// Resolve `points` against `metadata`, look up each observer's terrain
	/// elevation in `elevation`, and compute effective view heights.
	pub fn build(metadata: &Metadata, elevation: &Layer<ElevationTile>, points: &[Point6D]) -> anyhow::Result<Self> {
		let mut by_key: HashMap<TileKey, Vec<PointInfo>> = HashMap::new();
		let mut by_index = HashMap::new();
		let mut heights = HashMap::new();

		for (index, point) in points.iter().enumerate() {
			let info = resolve_point(metadata, index, point)?;

			anyhow::ensure!(
				by_index.insert(index, info).is_none(),
				ViewshedError::InvalidLayer(format!("duplicate observer index {index}"))
			);

			let terrain_elevation = elevation
				.get(info.key)
				.and_then(|tile| tile.get(i64::from(info.col), i64::from(info.row)))
				.ok_or_else(|| ViewshedError::InvalidLayer(format!("no elevation sample at observer {index}'s pixel")))?;

			let effective_height = if info.view_height >= 0.0 {
				terrain_elevation + info.view_height
			} else {
				-info.view_height
			};
			heights.insert(index, effective_height);

			by_key.entry(info.key).or_default().push(info);
		}

		Ok(ObserverTables { by_key, by_index, heights })
	}

	#[must_use]
	pub fn observers_at(&self, key: TileKey) -> &[PointInfo] {
		self.by_key.get(&key).map_or(&[], Vec::as_slice)
	}

	pub fn info_of(&self, index: usize) -> anyhow::Result<&PointInfo> {
		self.by_index.get(&index).ok_or(ViewshedError::ObserverUnknownIndex(index).into())
	}

	pub fn effective_height_of(&self, index: usize) -> anyhow::Result<f64> {
		self.heights.get(&index).copied().ok_or(ViewshedError::ObserverUnknownIndex(index).into())
	}

	/// All observer indices seen, ascending — the processing order §4.E
	/// requires within a tile task.
	#[must_use]
	pub fn sorted_indices_at(&self, key: TileKey) -> Vec<usize> {
		let mut indices: Vec<usize> = self.observers_at(key).iter().map(|info| info.index).collect();
		indices.sort_unstable();
		indices
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap as Map;
	use viewshed_core::{CellType, Crs, Extent, Layout};

	fn flat_metadata() -> Metadata {
		let layout = Layout::new(4, 4, 8, 8).unwrap();
		let extent = Extent::new(0.0, 0.0, 8.0, 8.0).unwrap();
		Metadata::new(CellType::Float64, layout, Crs::Geographic, extent, layout.key_bounds()).unwrap()
	}

	fn flat_elevation_layer(metadata: &Metadata, elevation_m: f64) -> Layer<ElevationTile> {
		let mut tiles = Map::new();
		for key in metadata.bounds.iter() {
			tiles.insert(key, ElevationTile::flat(4, 4, elevation_m));
		}
		Layer::new(metadata.clone(), tiles).unwrap()
	}

	#[test]
	fn resolve_point_maps_to_tile_and_intra_coords() {
		let metadata = flat_metadata();
		let point = Point6D::new(5.0, 5.0, 2.0, 0.0, -1.0, f64::NEG_INFINITY);
		let info = resolve_point(&metadata, 0, &point).unwrap();
		assert_eq!(info.key, TileKey::new(1, 0));
	}

	#[test]
	fn out_of_extent_observer_fails() {
		let metadata = flat_metadata();
		let point = Point6D::new(100.0, 100.0, 2.0, 0.0, -1.0, f64::NEG_INFINITY);
		let err = resolve_point(&metadata, 0, &point).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<ViewshedError>(),
			Some(ViewshedError::ObserverOutOfLayout { .. })
		));
	}

	#[test]
	fn effective_height_adds_terrain_for_relative_view_height() {
		let metadata = flat_metadata();
		let layer = flat_elevation_layer(&metadata, 10.0);
		let points = vec![Point6D::new(1.0, 1.0, 2.0, 0.0, -1.0, f64::NEG_INFINITY)];
		let tables = ObserverTables::build(&metadata, &layer, &points).unwrap();
		assert_eq!(tables.effective_height_of(0).unwrap(), 12.0);
	}

	#[test]
	fn effective_height_is_absolute_for_negative_view_height() {
		let metadata = flat_metadata();
		let layer = flat_elevation_layer(&metadata, 10.0);
		let points = vec![Point6D::new(1.0, 1.0, -100.0, 0.0, -1.0, f64::NEG_INFINITY)];
		let tables = ObserverTables::build(&metadata, &layer, &points).unwrap();
		assert_eq!(tables.effective_height_of(0).unwrap(), 100.0);
	}

	#[test]
	fn unknown_index_is_reported() {
		let metadata = flat_metadata();
		let layer = flat_elevation_layer(&metadata, 0.0);
		let tables = ObserverTables::build(&metadata, &layer, &[]).unwrap();
		let err = tables.info_of(42).unwrap_err();
		assert!(matches!(err.downcast_ref::<ViewshedError>(), Some(ViewshedError::ObserverUnknownIndex(42))));
	}

	#[test]
	fn sorted_indices_are_ascending() {
		let metadata = flat_metadata();
		let layer = flat_elevation_layer(&metadata, 0.0);
		let points = vec![
			Point6D::new(5.0, 5.0, 1.0, 0.0, -1.0, f64::NEG_INFINITY),
			Point6D::new(6.0, 6.0, 1.0, 0.0, -1.0, f64::NEG_INFINITY),
			Point6D::new(5.5, 5.5, 1.0, 0.0, -1.0, f64::NEG_INFINITY),
		];
		let tables = ObserverTables::build(&metadata, &layer, &points).unwrap();
		let key = TileKey::new(1, 0);
		assert_eq!(tables.sorted_indices_at(key), vec![0, 1, 2]);
	}
}
