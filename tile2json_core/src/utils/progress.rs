//! A `\r`-rewriting progress line on stderr.
//!
//! Redraws are rate-limited so reporting from a hot loop never floods the
//! terminal. The line shows percent, processed/total and the current rate;
//! `finish` prints a final newline so subsequent output starts clean.

use std::io::{Write, stderr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MIN_REDRAW_INTERVAL: Duration = Duration::from_secs(1);

struct Inner {
	message: String,
	total: u64,
	pos: u64,
	start: Instant,
	last_draw: Option<Instant>,
	redraw_interval: Duration,
	finished: bool,
	enabled: bool,
}

impl Inner {
	fn rate(&self) -> f64 {
		let elapsed = self.start.elapsed().as_secs_f64();
		if elapsed > 0.0 { self.pos as f64 / elapsed } else { 0.0 }
	}

	fn percent(&self) -> f64 {
		if self.total == 0 {
			0.0
		} else {
			(self.pos as f64 * 100.0 / self.total as f64).min(100.0)
		}
	}

	fn redraw(&mut self, force: bool) {
		if !self.enabled {
			return;
		}
		if !force {
			if let Some(last) = self.last_draw {
				if last.elapsed() < self.redraw_interval {
					return;
				}
			}
		}
		self.last_draw = Some(Instant::now());
		let line = format!(
			"\r{}: {:.1}% ({}/{} tiles, {:.2} tiles/sec)",
			self.message,
			self.percent(),
			self.pos,
			self.total,
			self.rate()
		);
		let mut err = stderr();
		let _ = err.write_all(line.as_bytes());
		let _ = err.flush();
	}
}

/// A cloneable, thread-safe progress line.
#[derive(Clone)]
pub struct ProgressLine {
	inner: Arc<Mutex<Inner>>,
}

impl ProgressLine {
	pub fn new(message: &str, total: u64) -> ProgressLine {
		ProgressLine {
			inner: Arc::new(Mutex::new(Inner {
				message: message.to_string(),
				total,
				pos: 0,
				start: Instant::now(),
				last_draw: None,
				redraw_interval: MIN_REDRAW_INTERVAL,
				finished: false,
				enabled: true,
			})),
		}
	}

	/// A progress line that never draws; counters still work.
	pub fn new_disabled(message: &str, total: u64) -> ProgressLine {
		let progress = ProgressLine::new(message, total);
		progress.inner.lock().unwrap().enabled = false;
		progress
	}

	/// Raises the redraw interval (never below the 1 s floor).
	pub fn set_redraw_interval(&self, interval: Duration) {
		self.inner.lock().unwrap().redraw_interval = interval.max(MIN_REDRAW_INTERVAL);
	}

	pub fn set_total(&self, total: u64) {
		let mut inner = self.inner.lock().unwrap();
		inner.total = total;
		inner.redraw(false);
	}

	pub fn set_position(&self, pos: u64) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = pos;
		inner.redraw(false);
	}

	pub fn inc(&self, delta: u64) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = inner.pos.saturating_add(delta);
		inner.redraw(false);
	}

	#[must_use]
	pub fn position(&self) -> u64 {
		self.inner.lock().unwrap().pos
	}

	#[must_use]
	pub fn rate(&self) -> f64 {
		self.inner.lock().unwrap().rate()
	}

	/// Draws a final line and terminates it with a newline.
	pub fn finish(&self) {
		let mut inner = self.inner.lock().unwrap();
		if inner.finished {
			return;
		}
		inner.finished = true;
		inner.redraw(true);
		if inner.enabled {
			let mut err = stderr();
			let _ = err.write_all(b"\n");
			let _ = err.flush();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_track_position() {
		let progress = ProgressLine::new_disabled("test", 100);
		progress.inc(10);
		progress.inc(20);
		assert_eq!(progress.position(), 30);
		progress.set_position(50);
		assert_eq!(progress.position(), 50);
	}

	#[test]
	fn rate_is_non_negative() {
		let progress = ProgressLine::new_disabled("test", 10);
		progress.inc(5);
		assert!(progress.rate() >= 0.0);
	}

	#[test]
	fn finish_is_idempotent() {
		let progress = ProgressLine::new_disabled("test", 2);
		progress.inc(2);
		progress.finish();
		progress.finish();
		assert_eq!(progress.position(), 2);
	}
}
