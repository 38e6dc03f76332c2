use crate::{KeyBounds, TileKey};
use std::f64::consts::PI;

/// A rectangular geographic extent, `(xmin, ymin, xmax, ymax)`, in the
/// layer's native CRS units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
	pub xmin: f64,
	pub ymin: f64,
	pub xmax: f64,
	pub ymax: f64,
}

impl Extent {
	pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> anyhow::Result<Self> {
		anyhow::ensure!(
			xmin < xmax && ymin < ymax,
			crate::ViewshedError::InvalidLayer(format!("degenerate extent ({xmin},{ymin},{xmax},{ymax})"))
		);
		Ok(Extent { xmin, ymin, xmax, ymax })
	}

	#[must_use]
	pub fn width(&self) -> f64 {
		self.xmax - self.xmin
	}

	#[must_use]
	pub fn height(&self) -> f64 {
		self.ymax - self.ymin
	}
}

/// The coordinate reference system of a layer, restricted to the two
/// projections this engine needs to reason about distance in: already
/// geographic (degrees), or Web Mercator (EPSG:3857, meters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Crs {
	/// Coordinates are already longitude/latitude in degrees.
	Geographic,
	/// EPSG:3857 Web Mercator, the common tiling projection.
	WebMercator,
}

impl Crs {
	/// Project a single `(x, y)` point in this CRS to geographic
	/// longitude/latitude degrees, used by §4.A resolution estimation.
	#[must_use]
	pub fn to_geographic(self, x: f64, y: f64) -> (f64, f64) {
		match self {
			Crs::Geographic => (x, y),
			Crs::WebMercator => {
				let lon = x / crate::EARTH_RADIUS_M * 180.0 / PI;
				let lat = (2.0 * (y / crate::EARTH_RADIUS_M).exp().atan() - PI / 2.0) * 180.0 / PI;
				(lon, lat)
			}
		}
	}
}

/// The regular tile grid of a layer: tile size plus total raster size, both
/// in pixels. `total_cols`/`total_rows` must be exact multiples of
/// `tile_cols`/`tile_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
	pub tile_cols: u32,
	pub tile_rows: u32,
	pub total_cols: u32,
	pub total_rows: u32,
}

impl Layout {
	pub fn new(tile_cols: u32, tile_rows: u32, total_cols: u32, total_rows: u32) -> anyhow::Result<Self> {
		anyhow::ensure!(
			tile_cols > 0
				&& tile_rows > 0
				&& total_cols > 0
				&& total_rows > 0
				&& total_cols % tile_cols == 0
				&& total_rows % tile_rows == 0,
			crate::ViewshedError::InvalidLayer(format!(
				"layout {total_cols}x{total_rows} is not a multiple of tile size {tile_cols}x{tile_rows}"
			))
		);
		Ok(Layout { tile_cols, tile_rows, total_cols, total_rows })
	}

	/// The rectangle of [`TileKey`]s implied by this layout, with `(0, 0)`
	/// at the top-left tile.
	#[must_use]
	pub fn key_bounds(&self) -> KeyBounds {
		KeyBounds::new(
			TileKey::new(0, 0),
			TileKey::new(
				i64::from(self.total_cols / self.tile_cols) - 1,
				i64::from(self.total_rows / self.tile_rows) - 1,
			),
		)
		.expect("non-empty layout always produces a valid rectangle")
	}

	/// The `layout.mapTransform` of §4.B: locate `(x, y)` in `extent` to a
	/// `(TileKey, col, row)` triple, or `None` if the point does not fall
	/// strictly inside a single pixel of the grid.
	#[must_use]
	pub fn locate(&self, extent: &Extent, x: f64, y: f64) -> Option<(TileKey, u32, u32)> {
		if !x.is_finite() || !y.is_finite() {
			return None;
		}
		let fx = (x - extent.xmin) / extent.width() * f64::from(self.total_cols);
		let fy = (extent.ymax - y) / extent.height() * f64::from(self.total_rows);
		if !(0.0..f64::from(self.total_cols)).contains(&fx) || !(0.0..f64::from(self.total_rows)).contains(&fy) {
			return None;
		}
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let pixel_col = fx.floor() as u32;
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let pixel_row = fy.floor() as u32;
		let key = TileKey::new(
			i64::from(pixel_col / self.tile_cols),
			i64::from(pixel_row / self.tile_rows),
		);
		let col = pixel_col % self.tile_cols;
		let row = pixel_row % self.tile_rows;
		Some((key, col, row))
	}
}
