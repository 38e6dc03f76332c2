/// The aggregation operator combining a ray pass's verdict with the prior
/// visibility value at a cell (§9 "Operator abstraction").
///
/// Kept as a closed sum type, not an arbitrary callback, so the driver can
/// rely on commutativity/idempotence statically (§5): the default `Or` is
/// both, which is what makes retries and duplicate messages harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
	/// Logical OR: a cell is visible if any ray pass marked it visible.
	/// Commutative and idempotent; the default and only operator the
	/// termination/retry guarantees of §5 are proven under.
	#[default]
	Or,
	/// Logical AND: a cell is visible only if every ray pass that touched
	/// it marked it visible. Commutative and idempotent.
	And,
	/// Running sum of visibility votes. Commutative but *not* idempotent:
	/// duplicate messages or retried tasks double-count a cell. Provided
	/// for diagnostics, not for production runs under retry (§5).
	Sum,
	/// Keep the most recently written raw value, for debugging kernel
	/// output without aggregation semantics.
	Debug,
}

impl Operator {
	/// Combine `current` (or `None` if the cell has no information yet)
	/// with an incoming per-ray verdict, encoded as `0.0`/`1.0` for the
	/// Boolean operators and the raw value for `Sum`/`Debug`.
	#[must_use]
	pub fn combine(self, current: Option<f64>, incoming: f64) -> f64 {
		match self {
			Operator::Or => match current {
				None => incoming,
				Some(c) => f64::from((c != 0.0) || (incoming != 0.0)),
			},
			Operator::And => match current {
				None => incoming,
				Some(c) => f64::from((c != 0.0) && (incoming != 0.0)),
			},
			Operator::Sum => current.unwrap_or(0.0) + incoming,
			Operator::Debug => incoming,
		}
	}

	/// Whether this operator is safe under the bus's at-least-once,
	/// unordered delivery guarantee (§5, §8 "Duplicate tolerance").
	#[must_use]
	pub fn is_idempotent(self) -> bool {
		matches!(self, Operator::Or | Operator::And)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn or_is_idempotent_and_commutative() {
		assert!(Operator::Or.is_idempotent());
		let first = Operator::Or.combine(None, 1.0);
		let a = Operator::Or.combine(Some(first), 1.0);
		let b = Operator::Or.combine(Some(first), 0.0);
		assert_eq!(a, 1.0);
		assert_eq!(b, 1.0);
	}

	#[test]
	fn sum_is_not_idempotent() {
		assert!(!Operator::Sum.is_idempotent());
		let once = Operator::Sum.combine(None, 1.0);
		let twice = Operator::Sum.combine(Some(once), 1.0);
		assert_ne!(once, twice);
	}

	#[test]
	fn and_requires_all_votes() {
		let first = Operator::And.combine(None, 1.0);
		let c = Operator::And.combine(Some(first), 0.0);
		assert_eq!(c, 0.0);
	}
}
