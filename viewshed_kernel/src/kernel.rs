use std::collections::HashMap;
use viewshed_core::{curvature_drop_m, Direction, ElevationTile, Ray, VisibilityTile, ALTITUDE_USE_TERRAIN};

use crate::params::KernelParams;

/// Floating-point slack for the `alpha_cur >= alpha_max` visibility
/// comparison (§4.C step 3), distinct from `params.epsilon`'s much coarser
/// trig-snap role: this only guards against rounding noise between samples
/// that are mathematically tied, not a tunable occlusion threshold.
const VISIBILITY_EPSILON: f64 = 1e-9;

/// Everything the kernel needs for one call (§4.C "Inputs").
pub struct KernelInput<'a> {
	pub elevation: &'a ElevationTile,
	pub visibility: &'a mut VisibilityTile,
	/// Observer's position in *this tile's* pixel frame. May lie outside
	/// `[0, cols) x [0, rows)` when the causal observer lives elsewhere.
	pub start_col: i64,
	pub start_row: i64,
	/// Observer's absolute (terrain + offset) eye elevation, in meters.
	pub view_height: f64,
	/// The edge these `rays` crossed to enter this tile, or `FromInside`
	/// when the observer is hosted here and `rays` is `None`.
	pub direction: Direction,
	/// Pre-sorted (ascending `theta`) incoming rays. Must be `None` iff
	/// `direction == FromInside`.
	pub rays: Option<Vec<Ray>>,
}

/// Run the R2 kernel once and return the outgoing bundle, keyed by the
/// [`Direction`] label the *receiving* neighbor will see (§4.C "Emission").
///
/// # Panics
/// If `rays.is_some() != (direction != FromInside)`.
pub fn run_kernel(input: KernelInput<'_>, params: &KernelParams) -> HashMap<Direction, Vec<Ray>> {
	let KernelInput { elevation, visibility, start_col, start_row, view_height, direction, rays } = input;
	assert_eq!(rays.is_some(), direction != Direction::FromInside, "entering rays must accompany a non-FromInside direction");

	let cols = i64::from(elevation.cols());
	let rows = i64::from(elevation.rows());
	let mut bundle: HashMap<Direction, Vec<Ray>> = HashMap::new();

	match rays {
		None => {
			mark_origin_if_inside(visibility, start_col, start_row, params);
			for theta in boundary_thetas(start_col, start_row, cols, rows, params) {
				trace_one(elevation, visibility, start_col, start_row, view_height, theta, f64::NEG_INFINITY, 0.0, params, &mut bundle);
			}
		}
		Some(rays) => {
			for ray in rays {
				trace_one(elevation, visibility, start_col, start_row, view_height, ray.theta, ray.alpha, ray.v0, params, &mut bundle);
			}
		}
	}

	bundle
}

fn mark_origin_if_inside(visibility: &mut VisibilityTile, start_col: i64, start_row: i64, params: &KernelParams) {
	if (0..i64::from(visibility.cols())).contains(&start_col) && (0..i64::from(visibility.rows())).contains(&start_row) {
		#[allow(clippy::cast_sign_loss)]
		visibility.apply(start_col as u32, start_row as u32, 1.0, params.operator);
	}
}

/// Every boundary pixel's launch azimuth, filtered by `cameraFOV` (§4.C
/// steps 6, "active quadrants").
fn boundary_thetas(start_col: i64, start_row: i64, cols: i64, rows: i64, params: &KernelParams) -> Vec<f64> {
	let mut pixels = Vec::with_capacity(2 * (cols + rows) as usize);
	for col in 0..cols {
		pixels.push((col, 0));
		pixels.push((col, rows - 1));
	}
	for row in 0..rows {
		pixels.push((0, row));
		pixels.push((cols - 1, row));
	}

	pixels
		.into_iter()
		.map(|(col, row)| {
			let dcol = (col - start_col) as f64;
			let drow = (row - start_row) as f64;
			dcol.atan2(-drow)
		})
		.filter(|&theta| in_field_of_view(theta, params))
		.collect()
}

fn in_field_of_view(theta: f64, params: &KernelParams) -> bool {
	if params.is_omnidirectional() {
		return true;
	}
	let mut delta = theta - params.camera_direction;
	delta = delta.rem_euclid(std::f64::consts::TAU);
	if delta > std::f64::consts::PI {
		delta -= std::f64::consts::TAU;
	}
	delta.abs() <= params.camera_fov / 2.0
}

#[allow(clippy::too_many_arguments)]
fn trace_one(
	elevation: &ElevationTile,
	visibility: &mut VisibilityTile,
	start_col: i64,
	start_row: i64,
	view_height: f64,
	theta: f64,
	entry_alpha: f64,
	entry_v0: f64,
	params: &KernelParams,
	bundle: &mut HashMap<Direction, Vec<Ray>>,
) {
	let cols = i64::from(elevation.cols());
	let rows = i64::from(elevation.rows());

	let mut dx = theta.sin();
	let mut dy = -theta.cos();
	if dx.abs() < params.epsilon {
		dx = 0.0;
	}
	if dy.abs() < params.epsilon {
		dy = 0.0;
	}

	let max_t = params.max_distance / params.resolution;
	let Some((t_enter, t_exit)) = clip_to_box(start_col as f64, start_row as f64, dx, dy, cols as f64, rows as f64, max_t) else {
		return;
	};

	let mut alpha_max = entry_alpha;
	let mut last_value = entry_v0;
	let mut last_cell: Option<(i64, i64)> = None;

	let mut t = t_enter.ceil().max(0.0);
	while t <= t_exit {
		let fx = start_col as f64 + t * dx;
		let fy = start_row as f64 + t * dy;
		t += 1.0;

		let col = fx.round() as i64;
		let row = fy.round() as i64;
		if col < 0 || col >= cols || row < 0 || row >= rows {
			continue;
		}
		if last_cell == Some((col, row)) {
			continue;
		}
		last_cell = Some((col, row));

		let dcol = (col - start_col) as f64;
		let drow = (row - start_row) as f64;
		let horiz_px = dcol.hypot(drow);
		if horiz_px <= 0.0 {
			continue;
		}
		let horiz_m = horiz_px * params.resolution;
		if horiz_m > params.max_distance {
			break;
		}

		let Some(terrain) = elevation.get(col, row) else { continue };
		let offset = if params.altitude == ALTITUDE_USE_TERRAIN { 0.0 } else { params.altitude };
		let mut target_elev = terrain + offset;
		if params.curvature {
			target_elev -= curvature_drop_m(horiz_m);
		}

		let alpha_cur = (target_elev - view_height) / horiz_m;
		let visible = alpha_cur >= alpha_max - VISIBILITY_EPSILON;
		last_value = if visible { 1.0 } else { 0.0 };
		#[allow(clippy::cast_sign_loss)]
		visibility.apply(col as u32, row as u32, last_value, params.operator);

		if alpha_cur > alpha_max {
			alpha_max = alpha_cur;
		}
	}

	let fx = start_col as f64 + t_exit * dx;
	let fy = start_row as f64 + t_exit * dy;
	if let Some(exit_side) = exit_edge(fx, fy, cols, rows) {
		let exit_m = (fx - start_col as f64).hypot(fy - start_row as f64) * params.resolution;
		if exit_m < params.max_distance {
			let message_direction = exit_side.opposite();
			bundle.entry(message_direction).or_default().push(Ray::new(theta, alpha_max, last_value, exit_m));
		}
	}
}

/// Clip the ray `origin + t*(dx,dy)` (for `t >= 0`) against the box
/// `[0, cols] x [0, rows]`, also bounded above by `max_t`. Returns `None`
/// when the ray never touches the box within that range.
fn clip_to_box(ox: f64, oy: f64, dx: f64, dy: f64, cols: f64, rows: f64, max_t: f64) -> Option<(f64, f64)> {
	let (tx0, tx1) = slab(ox, dx, 0.0, cols)?;
	let (ty0, ty1) = slab(oy, dy, 0.0, rows)?;
	let t_enter = tx0.max(ty0).max(0.0);
	let t_exit = tx1.min(ty1).min(max_t);
	if t_enter >= t_exit {
		None
	} else {
		Some((t_enter, t_exit))
	}
}

fn slab(o: f64, d: f64, lo: f64, hi: f64) -> Option<(f64, f64)> {
	if d.abs() < 1e-15 {
		if (lo..=hi).contains(&o) {
			Some((f64::NEG_INFINITY, f64::INFINITY))
		} else {
			None
		}
	} else {
		let a = (lo - o) / d;
		let b = (hi - o) / d;
		Some((a.min(b), a.max(b)))
	}
}

/// Which edge of `self` the box-exit point `(fx, fy)` lies on, named as the
/// compass edge of the *exiting* tile (not yet the neighbor's entry label —
/// see [`Direction::opposite`]).
fn exit_edge(fx: f64, fy: f64, cols: i64, rows: i64) -> Option<Direction> {
	const TOL: f64 = 1e-6;
	if fy <= TOL {
		Some(Direction::FromNorth)
	} else if fy >= rows as f64 - TOL {
		Some(Direction::FromSouth)
	} else if fx <= TOL {
		Some(Direction::FromWest)
	} else if fx >= cols as f64 - TOL {
		Some(Direction::FromEast)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use viewshed_core::Operator;

	fn flat_params() -> KernelParams {
		KernelParams { curvature: false, ..KernelParams::omnidirectional(10.0, 10_000.0) }
	}

	#[test]
	fn flat_tile_is_fully_visible_from_center() {
		let elevation = ElevationTile::flat(9, 9, 0.0);
		let mut visibility = VisibilityTile::empty(9, 9);
		let params = flat_params();
		let input = KernelInput {
			elevation: &elevation,
			visibility: &mut visibility,
			start_col: 4,
			start_row: 4,
			view_height: 2.0,
			direction: Direction::FromInside,
			rays: None,
		};
		let bundle = run_kernel(input, &params);
		assert!(!bundle.is_empty(), "rays reaching the tile boundary well under max_distance must be re-emitted");
		for row in 0..9 {
			for col in 0..9 {
				assert!(visibility.has_info(col, row), "({col},{row}) untouched");
				assert_eq!(visibility.get_raw(col, row), Some(1.0), "({col},{row}) should be visible on a flat plane");
			}
		}
	}

	#[test]
	fn wall_shadows_far_side() {
		let mut elevation = ElevationTile::flat(9, 1, 0.0);
		elevation.set(4, 0, 1000.0);
		let mut visibility = VisibilityTile::empty(9, 1);
		let params = flat_params();
		let input = KernelInput {
			elevation: &elevation,
			visibility: &mut visibility,
			start_col: 0,
			start_row: 0,
			view_height: 2.0,
			direction: Direction::FromInside,
			rays: None,
		};
		run_kernel(input, &params);
		assert_eq!(visibility.get_raw(4, 0), Some(1.0), "the wall itself is visible");
		assert_eq!(visibility.get_raw(8, 0), Some(0.0), "cell behind the wall is shadowed");
	}

	#[test]
	fn ray_exits_east_and_is_labeled_for_the_western_entry_of_the_next_tile() {
		let elevation = ElevationTile::flat(4, 4, 0.0);
		let mut visibility = VisibilityTile::empty(4, 4);
		let params = KernelParams { curvature: false, ..KernelParams::omnidirectional(10.0, 1_000_000.0) };
		let input = KernelInput {
			elevation: &elevation,
			visibility: &mut visibility,
			start_col: 0,
			start_row: 2,
			view_height: 2.0,
			direction: Direction::FromInside,
			rays: None,
		};
		let bundle = run_kernel(input, &params);
		let east_bound = bundle.get(&Direction::FromWest).expect("a due-east ray should be labeled FromWest for its target");
		assert!(east_bound
			.iter()
			.any(|r| (r.theta.rem_euclid(std::f64::consts::TAU) - std::f64::consts::FRAC_PI_2).abs() < 1e-6));
	}

	#[test]
	fn entering_ray_continues_with_its_carried_alpha_max() {
		let elevation = ElevationTile::flat(4, 4, 0.0);
		let mut visibility = VisibilityTile::empty(4, 4);
		let params = KernelParams { curvature: false, ..KernelParams::omnidirectional(10.0, 1_000_000.0) };
		// A ray entering from the west (crossing this tile's west edge),
		// launched due east (theta = pi/2), carrying a steep alpha_max that
		// should suppress visibility until the far side out-climbs it.
		let ray = Ray::new(std::f64::consts::FRAC_PI_2, 10.0, 1.0, 0.0);
		let input = KernelInput {
			elevation: &elevation,
			visibility: &mut visibility,
			start_col: -100,
			start_row: 1,
			view_height: 2.0,
			direction: Direction::FromWest,
			rays: Some(vec![ray]),
		};
		run_kernel(input, &params);
		for col in 0..4 {
			assert_eq!(visibility.get_raw(col, 1), Some(0.0), "alpha_max carried from the prior tile suppresses this flat run");
		}
	}

	#[test]
	fn omnidirectional_allows_every_bearing() {
		assert!(in_field_of_view(0.0, &KernelParams::omnidirectional(1.0, 1.0)));
		assert!(in_field_of_view(3.0, &KernelParams::omnidirectional(1.0, 1.0)));
	}

	#[test]
	fn narrow_fov_excludes_the_opposite_bearing() {
		let params = KernelParams {
			camera_direction: 0.0,
			camera_fov: std::f64::consts::FRAC_PI_4,
			..KernelParams::omnidirectional(1.0, 1.0)
		};
		assert!(in_field_of_view(0.0, &params));
		assert!(!in_field_of_view(std::f64::consts::PI, &params));
	}

	#[test]
	fn curvature_drop_reduces_apparent_height() {
		let near = curvature_drop_m(1_000.0);
		let far = curvature_drop_m(100_000.0);
		assert!(far > near);
		assert_relative_eq!(curvature_drop_m(0.0), 0.0);
	}

	#[test]
	fn debug_operator_keeps_last_written_value() {
		let elevation = ElevationTile::flat(3, 3, 0.0);
		let mut visibility = VisibilityTile::empty(3, 3);
		let mut params = flat_params();
		params.operator = Operator::Debug;
		let input = KernelInput {
			elevation: &elevation,
			visibility: &mut visibility,
			start_col: 1,
			start_row: 1,
			view_height: 2.0,
			direction: Direction::FromInside,
			rays: None,
		};
		run_kernel(input, &params);
		assert_eq!(visibility.get_raw(0, 0), Some(1.0));
	}
}
