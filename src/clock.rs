//! Time sources for the request window and retry backoff.
//!
//! [`SystemClock`] reads [`Instant::now`] and sleeps on the tokio timer. [`ManualClock`] never
//! blocks: sleeping advances its virtual time and logs the requested delay, which keeps window
//! and backoff behavior deterministic under test.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Monotonic time source plus an async delay.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current instant.
	fn now(&self) -> Instant;

	/// Waits for `duration` before resolving.
	fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// Production clock backed by [`Instant::now`] and `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture {
		Box::pin(tokio::time::sleep(duration))
	}
}

/// Virtual clock whose time only moves when told to.
///
/// Clones share state, so a test can hand one clone to the executor and keep another to
/// advance time or inspect the recorded sleeps.
#[derive(Clone, Debug)]
pub struct ManualClock {
	now: Arc<Mutex<Instant>>,
	sleeps: Arc<Mutex<Vec<Duration>>>,
}
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: Instant) -> Self {
		Self { now: Arc::new(Mutex::new(start)), sleeps: Default::default() }
	}

	/// Moves virtual time forward.
	pub fn advance(&self, duration: Duration) {
		*self.now.lock() += duration;
	}

	/// Every delay requested through [`Clock::sleep`], in order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(Instant::now())
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture {
		self.sleeps.lock().push(duration);
		self.advance(duration);

		Box::pin(async {})
	}
}
