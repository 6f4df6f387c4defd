//! Caller-provided cancellation for long-running batch operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::{DecodeError, Result};

/// A shared cancel flag with an optional deadline.
///
/// Decoding and diffing check the token at coarse granularity: once per
/// decoded class and once per diffed pair. A tripped token makes the
/// operation fail with [`DecodeError::Cancelled`] and no partial output.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
	inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	flag: AtomicBool,
	deadline: Option<Instant>,
}

impl CancelToken {
	pub fn new() -> CancelToken {
		CancelToken::default()
	}

	pub fn with_deadline(deadline: Instant) -> CancelToken {
		CancelToken {
			inner: Arc::new(Inner { flag: AtomicBool::new(false), deadline: Some(deadline) }),
		}
	}

	pub fn cancel(&self) {
		self.inner.flag.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.flag.load(Ordering::Relaxed)
			|| self.inner.deadline.is_some_and(|deadline| Instant::now() >= deadline)
	}

	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			Err(DecodeError::Cancelled)
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod testing {
	use std::time::{Duration, Instant};
	use crate::cancel::CancelToken;
	use crate::error::DecodeError;

	#[test]
	fn fresh_token_passes() {
		assert!(CancelToken::new().check().is_ok());
	}

	#[test]
	fn cancelled_token_trips() {
		let token = CancelToken::new();
		let clone = token.clone();
		clone.cancel();
		assert_eq!(token.check(), Err(DecodeError::Cancelled));
	}

	#[test]
	fn expired_deadline_trips() {
		let token = CancelToken::with_deadline(Instant::now() - Duration::from_secs(1));
		assert!(token.is_cancelled());
	}
}
