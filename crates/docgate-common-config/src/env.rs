// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! A secret named `VAR` may be given directly in `VAR`, or as a path in
//! `VAR_FILE` (the convention used by Docker and Kubernetes secret mounts).
//! `VAR_FILE` wins when both are set. One trailing newline is stripped from
//! file contents.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;

use crate::secret::SecretString;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Reads `VAR_FILE` or `VAR`. Returns `Ok(None)` when neither is set.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path) = env::var(&file_var) {
		if path.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}
		let path = PathBuf::from(path);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;
		let value = content.strip_suffix('\n').unwrap_or(&content);
		return Ok(Some(SecretString::from(value)));
	}

	Ok(env::var(var).ok().map(SecretString::from))
}

/// Tries each variable in order and returns the first secret found.
pub fn load_secret_env_any(vars: &[&str]) -> Result<Option<SecretString>, SecretEnvError> {
	for var in vars {
		if let Some(secret) = load_secret_env(var)? {
			return Ok(Some(secret));
		}
	}
	Ok(None)
}
