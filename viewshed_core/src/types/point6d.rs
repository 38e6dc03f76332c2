use crate::ALTITUDE_USE_TERRAIN;

/// An observer as supplied by the caller: six doubles on the wire (§6).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point6D {
	/// X coordinate in the layer's CRS units.
	pub x: f64,
	/// Y coordinate in the layer's CRS units.
	pub y: f64,
	/// If `>= 0`, height above terrain at `(x, y)`; if `< 0`, `-viewHeight`
	/// is an absolute height above the vertical datum.
	pub view_height: f64,
	/// Azimuth in radians.
	pub angle: f64,
	/// Half-angle in radians; `< 0` is the omnidirectional sentinel.
	pub field_of_view: f64,
	/// Target altitude in meters; [`ALTITUDE_USE_TERRAIN`] means "use
	/// terrain height".
	pub altitude: f64,
}

impl Point6D {
	#[must_use]
	pub fn new(x: f64, y: f64, view_height: f64, angle: f64, field_of_view: f64, altitude: f64) -> Self {
		Point6D { x, y, view_height, angle, field_of_view, altitude }
	}

	/// `fieldOfView < 0` is the omnidirectional sentinel (§3, §9 open
	/// question resolution).
	#[must_use]
	pub fn is_omnidirectional(&self) -> bool {
		self.field_of_view < 0.0
	}

	/// Whether `altitude` requests terrain-following behavior.
	#[must_use]
	pub fn wants_terrain_altitude(&self) -> bool {
		self.altitude == ALTITUDE_USE_TERRAIN
	}

	/// Whether `viewHeight` encodes an absolute height rather than a
	/// height-above-terrain offset.
	#[must_use]
	pub fn has_absolute_view_height(&self) -> bool {
		self.view_height < 0.0
	}
}
