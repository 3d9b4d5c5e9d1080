// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"clickwrap_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Thread-safe per-executor counters, available without the `metrics` feature.
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
	attempts: AtomicU64,
	retries: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	rejected: AtomicU64,
}
impl ExecutorMetrics {
	/// Returns the number of HTTP attempts sent, retries included.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of backoff sleeps taken.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that returned a value.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of admitted calls that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of calls refused by the rate limiter.
	pub fn rejections(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: CallOutcome) {
		let counter = match outcome {
			CallOutcome::Attempt => &self.attempts,
			CallOutcome::Retry => &self.retries,
			CallOutcome::Success => &self.success,
			CallOutcome::Failure => &self.failure,
			CallOutcome::Rejected => &self.rejected,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		record_call_outcome(CallKind::Request, outcome);
	}
}
