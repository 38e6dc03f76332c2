use std::f64::consts::PI;
use viewshed_core::{Metadata, ViewshedError, EARTH_RADIUS_M};

/// Component A: compute meters-per-pixel for a layer (§4.A).
///
/// Picks one [`viewshed_core::TileKey`] (the bounds' minimum key), projects
/// its column span to geographic coordinates, and approximates the span's
/// width in meters using the equatorial circumference `2·π·R / 360°`. The
/// design assumes a near-equidistant layout and does not re-estimate per
/// tile.
pub fn compute_resolution(metadata: &Metadata) -> anyhow::Result<f64> {
	let layout = &metadata.layout;
	let extent = &metadata.extent;
	let key = metadata.bounds.min_key;

	let tile_width_native = extent.width() * f64::from(layout.tile_cols) / f64::from(layout.total_cols);
	#[allow(clippy::cast_precision_loss)]
	let x_min = extent.xmin + (key.col as f64) * tile_width_native;
	let x_max = x_min + tile_width_native;
	#[allow(clippy::cast_precision_loss)]
	let y_mid = extent.ymax
		- (extent.height() / f64::from(layout.total_rows)) * ((key.row as f64) * f64::from(layout.tile_rows) + 0.5 * f64::from(layout.tile_rows));

	let (lon_min, _) = metadata.crs.to_geographic(x_min, y_mid);
	let (lon_max, _) = metadata.crs.to_geographic(x_max, y_mid);

	let meters_per_degree = 2.0 * PI * EARTH_RADIUS_M / 360.0;
	let width_m = (lon_max - lon_min).abs() * meters_per_degree;

	anyhow::ensure!(
		width_m.is_finite() && width_m > 0.0,
		ViewshedError::InvalidLayer("degenerate tile extent while computing resolution".into())
	);

	Ok(width_m / f64::from(layout.tile_cols))
}
