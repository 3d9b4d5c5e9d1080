//! Sliding one-minute admission window over successful request timestamps.

// std
use std::collections::VecDeque;
// self
use crate::_prelude::*;

/// Width of the admission window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Counts successful requests inside the trailing [`WINDOW`].
///
/// Admission and recording are separate steps: [`SlidingWindow::admit`] only evicts and
/// compares, while [`SlidingWindow::record`] is called once the admitted request has
/// succeeded. An entry is evicted when it is strictly older than the window, so a timestamp
/// aged exactly 60 seconds still counts.
#[derive(Clone, Debug)]
pub struct SlidingWindow {
	limit: usize,
	window: Duration,
	timestamps: VecDeque<Instant>,
}
impl SlidingWindow {
	/// Creates an empty window admitting `limit` requests per [`WINDOW`].
	pub fn new(limit: usize) -> Self {
		Self::with_window(limit, WINDOW)
	}

	/// Creates an empty window with a custom width.
	pub fn with_window(limit: usize, window: Duration) -> Self {
		Self { limit, window, timestamps: VecDeque::with_capacity(limit.min(1024)) }
	}

	/// Evicts expired entries, then reports whether another request fits.
	pub fn admit(&mut self, now: Instant) -> bool {
		self.evict(now);

		self.timestamps.len() < self.limit
	}

	/// Records a completed request at `now`.
	///
	/// Instants earlier than the newest entry are clamped to it, keeping the sequence
	/// non-decreasing.
	pub fn record(&mut self, now: Instant) {
		let at = match self.timestamps.back() {
			Some(last) if *last > now => *last,
			_ => now,
		};

		self.timestamps.push_back(at);
	}

	/// Time until the oldest entry leaves the window, measured from `now`.
	pub fn retry_after(&self, now: Instant) -> Duration {
		self.timestamps
			.front()
			.map(|oldest| (*oldest + self.window).saturating_duration_since(now))
			.unwrap_or(Duration::ZERO)
	}

	/// Number of retained entries (as of the last eviction).
	pub fn len(&self) -> usize {
		self.timestamps.len()
	}

	/// Whether no entries are retained.
	pub fn is_empty(&self) -> bool {
		self.timestamps.is_empty()
	}

	/// Configured request limit.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Configured window width.
	pub fn window(&self) -> Duration {
		self.window
	}

	fn evict(&mut self, now: Instant) {
		while let Some(oldest) = self.timestamps.front() {
			if now.saturating_duration_since(*oldest) > self.window {
				self.timestamps.pop_front();
			} else {
				break;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fill(window: &mut SlidingWindow, at: Instant, count: usize) {
		for _ in 0..count {
			assert!(window.admit(at), "Requests under the limit must be admitted.");
			window.record(at);
		}
	}

	#[test]
	fn admits_until_limit_then_rejects() {
		let start = Instant::now();
		let mut window = SlidingWindow::new(3);

		fill(&mut window, start, 3);

		assert!(!window.admit(start + Duration::from_secs(1)));
		assert_eq!(window.len(), 3);
	}

	#[test]
	fn entries_aged_exactly_sixty_seconds_still_count() {
		let start = Instant::now();
		let mut window = SlidingWindow::new(2);

		fill(&mut window, start, 2);

		assert!(!window.admit(start + WINDOW));
		assert_eq!(window.len(), 2);
		assert!(window.admit(start + WINDOW + Duration::from_millis(1)));
		assert!(window.is_empty());
	}

	#[test]
	fn admission_alone_never_consumes_capacity() {
		let start = Instant::now();
		let mut window = SlidingWindow::new(1);

		for _ in 0..10 {
			assert!(window.admit(start));
		}

		assert!(window.is_empty());
	}

	#[test]
	fn eviction_is_front_first() {
		let start = Instant::now();
		let mut window = SlidingWindow::new(2);

		fill(&mut window, start, 1);
		fill(&mut window, start + Duration::from_secs(30), 1);

		assert!(window.admit(start + Duration::from_secs(61)));
		assert_eq!(window.len(), 1);
		assert_eq!(
			window.retry_after(start + Duration::from_secs(61)),
			Duration::from_secs(29)
		);
	}

	#[test]
	fn record_keeps_sequence_non_decreasing() {
		let start = Instant::now();
		let mut window = SlidingWindow::new(5);

		window.record(start + Duration::from_secs(10));
		window.record(start);

		assert_eq!(window.retry_after(start), Duration::from_secs(70));
		assert!(window.admit(start + Duration::from_secs(70)));
		assert_eq!(window.len(), 2);
		assert!(window.admit(start + Duration::from_secs(71)));
		assert!(window.is_empty());
	}
}
