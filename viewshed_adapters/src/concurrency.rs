/// Bounded concurrency limits for the adapters' tokio-driven fan-out,
/// mirroring the pack's split between I/O-bound and CPU-bound work.
///
/// `io` bounds concurrent reads/writes against a `LayerReader`/`LayerWriter`
/// (dominated by syscalls, so oversubscribed relative to core count); `cpu`
/// bounds concurrent kernel invocations (one per physical core, since the
/// R2 kernel is pure computation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
	pub io: usize,
	pub cpu: usize,
}

impl ConcurrencyLimits {
	#[must_use]
	pub fn detect() -> Self {
		let cores = num_cpus::get().max(1);
		ConcurrencyLimits { io: cores.saturating_mul(4).max(4), cpu: cores }
	}

	#[must_use]
	pub fn fixed(io: usize, cpu: usize) -> Self {
		ConcurrencyLimits { io: io.max(1), cpu: cpu.max(1) }
	}
}

impl Default for ConcurrencyLimits {
	fn default() -> Self {
		ConcurrencyLimits::detect()
	}
}
