/// A single line-of-sight ray, immutable once constructed (§3).
///
/// `theta` (launch azimuth) is preserved end-to-end as a ray crosses
/// multiple tiles; `alpha`, `v0` and `metric0` are updated at each tile
/// boundary to seed the next tile's kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
	/// Launch azimuth from the originating observer, radians.
	pub theta: f64,
	/// Current tangent of the elevation angle along the ray.
	pub alpha: f64,
	/// Intensity at the ray's entry to the current tile.
	pub v0: f64,
	/// Traveled metric distance at the ray's entry to the current tile.
	pub metric0: f64,
}

impl Ray {
	#[must_use]
	pub fn new(theta: f64, alpha: f64, v0: f64, metric0: f64) -> Self {
		Ray { theta, alpha, v0, metric0 }
	}

	/// The entry ray for a fresh observer: no traveled distance yet and an
	/// elevation angle low enough that the very first sample is always
	/// visible.
	#[must_use]
	pub fn origin(theta: f64) -> Self {
		Ray { theta, alpha: f64::NEG_INFINITY, v0: 0.0, metric0: 0.0 }
	}
}

/// Sort rays by ascending `theta`, the ordering the bus and kernel require
/// for rays crossing a tile boundary (§3, §4.C "Entering rays").
pub fn sort_rays_by_theta(rays: &mut [Ray]) {
	rays.sort_by(|a, b| a.theta.total_cmp(&b.theta));
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sort_orders_ascending_theta() {
		let mut rays = vec![Ray::origin(1.0), Ray::origin(-1.0), Ray::origin(0.5)];
		sort_rays_by_theta(&mut rays);
		let thetas: Vec<f64> = rays.iter().map(|r| r.theta).collect();
		assert_eq!(thetas, vec![-1.0, 0.5, 1.0]);
	}
}
