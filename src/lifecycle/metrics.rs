// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one client's refresh activity.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	attempts: AtomicU64,
	forced_renewals: AtomicU64,
	failures: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the number of `refresh_access_token` calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns how many forced renewals were started, whether or not they succeeded.
	pub fn forced_renewals(&self) -> u64 {
		self.forced_renewals.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced_renewal(&self) {
		self.forced_renewals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
