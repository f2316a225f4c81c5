// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient HTTP failures.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Statuses worth retrying: throttling, timeouts and server-side failures.
const RETRYABLE_STATUSES: [StatusCode; 6] = [
	StatusCode::TOO_MANY_REQUESTS,
	StatusCode::REQUEST_TIMEOUT,
	StatusCode::INTERNAL_SERVER_ERROR,
	StatusCode::BAD_GATEWAY,
	StatusCode::SERVICE_UNAVAILABLE,
	StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	/// Total attempts, including the first. `1` disables retrying.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A single attempt with no retries.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	/// Delay before retry number `attempt` (zero-based).
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
		let capped = exponential.min(self.max_delay.as_secs_f64());

		let delay = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};

		Duration::from_secs_f64(delay)
	}
}

/// Whether an HTTP status indicates a transient failure.
pub fn is_retryable_status(status: StatusCode) -> bool {
	RETRYABLE_STATUSES.contains(&status)
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		self.status().is_some_and(is_retryable_status)
	}
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or
/// `cfg.max_attempts` is reached.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;

	loop {
		let err = match f().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		attempt += 1;

		if !err.is_retryable() {
			warn!(error = ?err, attempt, "giving up on non-retryable error");
			return Err(err);
		}

		if attempt >= cfg.max_attempts {
			warn!(
				error = ?err,
				attempt,
				max_attempts = cfg.max_attempts,
				"retry attempts exhausted"
			);
			return Err(err);
		}

		let delay = cfg.delay_for(attempt - 1);
		warn!(
			error = ?err,
			attempt,
			max_attempts = cfg.max_attempts,
			delay_ms = delay.as_millis(),
			"retrying after transient error"
		);
		tokio::time::sleep(delay).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[derive(Debug)]
	struct Flaky {
		transient: bool,
	}

	impl RetryableError for Flaky {
		fn is_retryable(&self) -> bool {
			self.transient
		}
	}

	fn fast(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(5),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	#[tokio::test]
	async fn permanent_error_is_not_retried() {
		let calls = AtomicU32::new(0);

		let result: Result<(), Flaky> = retry(&fast(5), || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(Flaky { transient: false }) }
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn transient_error_uses_every_attempt() {
		let calls = AtomicU32::new(0);

		let result: Result<(), Flaky> = retry(&fast(4), || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(Flaky { transient: true }) }
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 4);
	}

	#[tokio::test]
	async fn recovers_after_transient_failures() {
		let calls = AtomicU32::new(0);

		let result: Result<u32, Flaky> = retry(&fast(5), || {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			async move {
				if n < 2 {
					Err(Flaky { transient: true })
				} else {
					Ok(n)
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), 2);
	}

	#[test]
	fn no_retry_makes_one_attempt() {
		let calls = AtomicU32::new(0);
		let cfg = RetryConfig {
			base_delay: Duration::from_millis(1),
			..RetryConfig::no_retry()
		};

		let _: Result<(), Flaky> = tokio_test::block_on(retry(&cfg, || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(Flaky { transient: true }) }
		}));

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn delay_grows_then_caps() {
		let cfg = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_millis(500),
			backoff_factor: 2.0,
			jitter: false,
		};
		assert_eq!(cfg.delay_for(0), Duration::from_millis(100));
		assert_eq!(cfg.delay_for(1), Duration::from_millis(200));
		assert_eq!(cfg.delay_for(2), Duration::from_millis(400));
		assert_eq!(cfg.delay_for(3), Duration::from_millis(500));
		assert_eq!(cfg.delay_for(9), Duration::from_millis(500));
	}

	#[test]
	fn jitter_stays_within_bounds() {
		let cfg = RetryConfig {
			jitter: true,
			..fast(3)
		};
		for attempt in 0..5 {
			let delay = cfg.delay_for(attempt);
			assert!(delay <= Duration::from_secs_f64(0.005 * 1.5));
		}
	}

	#[test]
	fn retryable_statuses() {
		assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
		assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
		assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
	}
}
