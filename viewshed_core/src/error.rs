use std::fmt;

/// The closed error taxonomy of §7: a caller can always recover one of
/// these four kinds from the `anyhow::Error` chain returned by the engine
/// via [`ViewshedError::downcast_ref`](anyhow::Error::downcast_ref).
///
/// Call sites attach additional context with `anyhow::Context::context`;
/// this type itself stays a plain, greppable label plus the minimal data
/// needed to act on it.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewshedError {
	/// `bounds` is not a rectangle, metadata is missing, or the layer is
	/// empty.
	InvalidLayer(String),
	/// An observer coordinate does not map to a single tile.
	ObserverOutOfLayout { index: usize, x: f64, y: f64 },
	/// Internal invariant violation: an index was absent from a broadcast
	/// table. Always fatal, always indicates a programming error.
	ObserverUnknownIndex(usize),
	/// Wraps any fault surfaced by the partitioned-dataset or broadcast
	/// substrate.
	SubstrateFailure(String),
}

impl fmt::Display for ViewshedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ViewshedError::InvalidLayer(msg) => write!(f, "invalid layer: {msg}"),
			ViewshedError::ObserverOutOfLayout { index, x, y } => {
				write!(f, "observer {index} at ({x}, {y}) does not map to a single tile")
			}
			ViewshedError::ObserverUnknownIndex(index) => {
				write!(f, "observer index {index} is absent from broadcast tables")
			}
			ViewshedError::SubstrateFailure(msg) => write!(f, "substrate failure: {msg}"),
		}
	}
}

impl std::error::Error for ViewshedError {}

impl ViewshedError {
	/// Whether the driver should retry the failing task (§7 policy):
	/// only transient substrate faults are worth retrying.
	#[must_use]
	pub fn is_retryable(&self) -> bool {
		matches!(self, ViewshedError::SubstrateFailure(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_is_stable_and_greppable() {
		let err = ViewshedError::ObserverOutOfLayout { index: 3, x: 1.0, y: 2.0 };
		assert_eq!(err.to_string(), "observer 3 at (1, 2) does not map to a single tile");
	}

	#[test]
	fn only_substrate_failure_is_retryable() {
		assert!(ViewshedError::SubstrateFailure("timeout".into()).is_retryable());
		assert!(!ViewshedError::InvalidLayer("empty".into()).is_retryable());
		assert!(!ViewshedError::ObserverOutOfLayout { index: 0, x: 0.0, y: 0.0 }.is_retryable());
		assert!(!ViewshedError::ObserverUnknownIndex(0).is_retryable());
	}

	#[test]
	fn downcasts_through_anyhow() {
		let err: anyhow::Error = anyhow::Error::new(ViewshedError::InvalidLayer("empty".into())).context("loading layer");
		let kind = err.downcast_ref::<ViewshedError>().expect("kind preserved");
		assert_eq!(kind, &ViewshedError::InvalidLayer("empty".into()));
	}
}
