//! Trailing-edge debouncing for an event-loop tick model.
//!
//! There is no timer thread: the owner passes the current time into every
//! call and polls on its own tick. Only the latest value survives a burst.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use touchline_pages::utils::Debouncer;
//!
//! let start = Instant::now();
//! let mut search = Debouncer::new(Duration::from_millis(300));
//! search.call(start, "ti");
//! search.call(start + Duration::from_millis(100), "tig");
//!
//! assert_eq!(search.poll(start + Duration::from_millis(350)), None);
//! assert_eq!(search.poll(start + Duration::from_millis(400)), Some("tig"));
//! ```

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
	delay: Duration,
	pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			pending: None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Records `value` and restarts the quiet period from `now`.
	pub fn call(&mut self, now: Instant, value: T) {
		self.pending = Some((now + self.delay, value));
	}

	/// Yields the latest value once the quiet period has elapsed.
	pub fn poll(&mut self, now: Instant) -> Option<T> {
		if self.deadline().is_some_and(|deadline| now >= deadline) {
			return self.flush();
		}
		None
	}

	/// Yields the pending value immediately.
	pub fn flush(&mut self) -> Option<T> {
		self.pending.take().map(|(_, value)| value)
	}

	/// Drops the pending value.
	pub fn cancel(&mut self) -> bool {
		self.pending.take().is_some()
	}

	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// When the pending value becomes due.
	pub fn deadline(&self) -> Option<Instant> {
		self.pending.as_ref().map(|(deadline, _)| *deadline)
	}
}
