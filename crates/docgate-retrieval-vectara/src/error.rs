// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Vectara client.

use docgate_acl::BackendError;
use docgate_common_http::RetryableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectaraError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("request timed out")]
	Timeout,

	/// 400. Vectara reports filter syntax errors this way.
	#[error("bad request: {0}")]
	BadRequest(String),

	#[error("invalid API key or insufficient permissions")]
	Unauthorized,

	#[error("rate limit exceeded")]
	RateLimited,

	/// 5xx.
	#[error("Vectara unavailable: {status} - {message}")]
	Unavailable { status: u16, message: String },

	#[error("Vectara API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	#[error("invalid response from Vectara: {0}")]
	InvalidResponse(String),
}

impl RetryableError for VectaraError {
	fn is_retryable(&self) -> bool {
		match self {
			VectaraError::Network(e) => e.is_retryable(),
			VectaraError::Timeout => true,
			VectaraError::RateLimited => true,
			VectaraError::Unavailable { .. } => true,
			VectaraError::BadRequest(_) => false,
			VectaraError::Unauthorized => false,
			VectaraError::ApiError { .. } => false,
			VectaraError::InvalidResponse(_) => false,
		}
	}
}

impl From<VectaraError> for BackendError {
	fn from(err: VectaraError) -> Self {
		match err {
			VectaraError::Network(e) if e.is_timeout() => BackendError::Timeout,
			VectaraError::Network(e) => BackendError::Transport(e.to_string()),
			VectaraError::Timeout => BackendError::Timeout,
			VectaraError::BadRequest(message) => BackendError::MalformedFilter { message },
			VectaraError::Unauthorized => BackendError::Unauthorized,
			VectaraError::RateLimited => BackendError::RateLimited,
			VectaraError::Unavailable { status, message } => {
				BackendError::Unavailable(format!("{status} - {message}"))
			}
			VectaraError::ApiError { status, message } => BackendError::Api { status, message },
			VectaraError::InvalidResponse(message) => BackendError::InvalidResponse(message),
		}
	}
}
