use viewshed_adapters::ConcurrencyLimits;
use viewshed_core::{Operator, DEFAULT_EPSILON};

/// The scalar knobs of the top-level entry point (§6): everything but
/// `elevation` and `points`, which vary per call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
	pub max_distance: f64,
	pub curvature: bool,
	pub operator: Operator,
	pub epsilon: f64,
	/// Ambient, not part of the public signature of §6: bounds how many
	/// tile-kernel tasks (CPU-bound) run concurrently per iteration (§5).
	pub concurrency: ConcurrencyLimits,
}

impl EngineConfig {
	/// `maxDistance` is the one parameter §6 gives no default for; the rest
	/// start at the spec's stated defaults (`curvature=true, operator=Or,
	/// epsilon=1/pi`).
	#[must_use]
	pub fn new(max_distance: f64) -> Self {
		EngineConfig {
			max_distance,
			curvature: true,
			operator: Operator::Or,
			epsilon: DEFAULT_EPSILON,
			concurrency: ConcurrencyLimits::detect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_spec() {
		let config = EngineConfig::new(5_000.0);
		assert!(config.curvature);
		assert_eq!(config.operator, Operator::Or);
		assert_eq!(config.epsilon, DEFAULT_EPSILON);
	}
}
