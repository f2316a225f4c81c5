// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Errors surfaced by the query façade.

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
	/// The user id is not in the directory. No query is issued.
	#[error("unknown user: {user_id}")]
	UnknownUser { user_id: String },

	/// The backend failed; the error is passed through unchanged.
	#[error(transparent)]
	Backend(#[from] BackendError),
}

impl AccessError {
	pub fn unknown_user(user_id: impl Into<String>) -> Self {
		Self::UnknownUser {
			user_id: user_id.into(),
		}
	}

	pub fn is_unknown_user(&self) -> bool {
		matches!(self, Self::UnknownUser { .. })
	}
}
