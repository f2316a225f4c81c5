// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use docgate_acl::GLOBAL_OWNER;
use tracing::warn;

use crate::runtime::DocgateConfig;
use crate::ConfigError;

pub fn validate_config(config: &DocgateConfig) -> Result<(), ConfigError> {
	validate_backend(config)?;
	validate_retry(config)?;
	validate_directory(config)?;
	Ok(())
}

fn validate_backend(config: &DocgateConfig) -> Result<(), ConfigError> {
	let backend = &config.backend;

	if backend.base_url.trim().is_empty() {
		return Err(ConfigError::invalid_value(
			"backend.base_url",
			"base_url cannot be empty",
		));
	}
	if !backend.base_url.starts_with("http://") && !backend.base_url.starts_with("https://") {
		return Err(ConfigError::invalid_value(
			"backend.base_url",
			"must start with http:// or https://",
		));
	}
	if backend.timeout.is_zero() {
		return Err(ConfigError::invalid_value(
			"backend.timeout_secs",
			"must be greater than 0",
		));
	}
	if backend.max_used_search_results == 0 {
		return Err(ConfigError::invalid_value(
			"backend.max_used_search_results",
			"must be at least 1",
		));
	}
	if backend.api_key.is_none() {
		warn!("no API key configured; remote queries will fail");
	}

	Ok(())
}

fn validate_retry(config: &DocgateConfig) -> Result<(), ConfigError> {
	let retry = &config.retry;

	if retry.max_attempts == 0 {
		return Err(ConfigError::invalid_value(
			"retry.max_attempts",
			"must be at least 1",
		));
	}
	if retry.max_attempts > 20 {
		return Err(ConfigError::invalid_value(
			"retry.max_attempts",
			"must be at most 20",
		));
	}
	if !(1.0..=10.0).contains(&retry.backoff_factor) {
		return Err(ConfigError::invalid_value(
			"retry.backoff_factor",
			"must be between 1.0 and 10.0",
		));
	}
	if retry.base_delay > retry.max_delay {
		return Err(ConfigError::invalid_value(
			"retry.base_delay_ms",
			"cannot be greater than max_delay_ms",
		));
	}

	Ok(())
}

fn validate_directory(config: &DocgateConfig) -> Result<(), ConfigError> {
	for (id, user) in &config.directory.users {
		if id.trim().is_empty() {
			return Err(ConfigError::invalid_value(
				"directory.users",
				"user id cannot be empty",
			));
		}
		// A user with this id would own every public document.
		if id == GLOBAL_OWNER {
			return Err(ConfigError::invalid_value(
				format!("directory.users.{id}"),
				format!("'{GLOBAL_OWNER}' is reserved for public documents"),
			));
		}
		if user.groups.iter().chain(&user.roles).any(|v| v.is_empty()) {
			return Err(ConfigError::invalid_value(
				format!("directory.users.{id}"),
				"group and role names cannot be empty",
			));
		}
	}
	Ok(())
}
