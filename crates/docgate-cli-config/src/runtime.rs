// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration with defaults resolved.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use docgate_acl::{GroupMatchMode, StaticDirectory, UserAttributes};
use docgate_common_config::SecretString;
use docgate_common_http::RetryConfig;

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.vectara.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_USED_SEARCH_RESULTS: u32 = 5;
pub const DEFAULT_GENERATION_PRESET: &str = "mockingbird-1.0-2024-07-16";
pub const DEFAULT_RERANKER: &str = "Rerank_Multilingual_v1";

/// The final, validated configuration.
#[derive(Debug, Clone)]
pub struct DocgateConfig {
	pub backend: BackendConfig,
	pub acl: AclConfig,
	pub retry: RetrySettings,
	pub logging: LoggingConfig,
	pub directory: DirectoryConfig,
	pub paths: PathsConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
	pub base_url: String,
	pub corpus_key: Option<String>,
	pub api_key: Option<SecretString>,
	pub timeout: Duration,
	pub max_used_search_results: u32,
	pub generation_preset: String,
	/// `None` disables reranking.
	pub reranker: Option<String>,
}

impl BackendConfig {
	pub fn require_corpus_key(&self) -> Result<&str, ConfigError> {
		self.corpus_key
			.as_deref()
			.ok_or_else(|| ConfigError::missing_field("backend.corpus_key (or DOCGATE_CORPUS_KEY / CORPUS_KEY)"))
	}

	pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
		self.api_key
			.as_ref()
			.ok_or_else(|| ConfigError::missing_field("backend.api_key (or DOCGATE_API_KEY / PERSONAL_API_KEY)"))
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AclConfig {
	pub group_match: GroupMatchMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetrySettings {
	fn default() -> Self {
		let http = RetryConfig::default();
		Self {
			max_attempts: http.max_attempts,
			base_delay: http.base_delay,
			max_delay: http.max_delay,
			backoff_factor: http.backoff_factor,
			jitter: http.jitter,
		}
	}
}

impl RetrySettings {
	pub fn to_retry_config(&self) -> RetryConfig {
		RetryConfig {
			max_attempts: self.max_attempts,
			base_delay: self.base_delay,
			max_delay: self.max_delay,
			backoff_factor: self.backoff_factor,
			jitter: self.jitter,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
	Error,
	#[default]
	Warn,
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

impl FromStr for LogLevel {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"error" => Ok(LogLevel::Error),
			"warn" | "warning" => Ok(LogLevel::Warn),
			"info" => Ok(LogLevel::Info),
			"debug" => Ok(LogLevel::Debug),
			"trace" => Ok(LogLevel::Trace),
			other => Err(ConfigError::invalid_value(
				"logging.level",
				format!("unknown level '{other}'"),
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	#[default]
	Pretty,
	Compact,
	Json,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"compact" => Ok(LogFormat::Compact),
			"json" => Ok(LogFormat::Json),
			other => Err(ConfigError::invalid_value(
				"logging.format",
				format!("unknown format '{other}'"),
			)),
		}
	}
}

/// Users declared under `[directory.users]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryConfig {
	pub users: BTreeMap<String, UserLayer>,
}

impl DirectoryConfig {
	pub fn is_empty(&self) -> bool {
		self.users.is_empty()
	}

	pub fn to_directory(&self) -> StaticDirectory {
		StaticDirectory::new(self.users.iter().map(|(id, entry)| {
			UserAttributes::new(id.clone())
				.with_groups(entry.groups.iter().cloned())
				.with_roles(entry.roles.iter().cloned())
		}))
	}
}

impl DocgateConfig {
	/// Build runtime config from a merged layer.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			backend: build_backend_config(layer.backend),
			acl: AclConfig {
				group_match: layer.acl.and_then(|a| a.group_match).unwrap_or_default(),
			},
			retry: build_retry_settings(layer.retry),
			logging: build_logging_config(layer.logging)?,
			directory: DirectoryConfig {
				users: layer.directory.map(|d| d.users).unwrap_or_default(),
			},
			paths,
		})
	}
}

fn build_backend_config(layer: Option<BackendLayer>) -> BackendConfig {
	let layer = layer.unwrap_or_default();
	BackendConfig {
		base_url: layer
			.base_url
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
		corpus_key: layer.corpus_key,
		api_key: layer.api_key,
		timeout: Duration::from_secs(layer.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
		max_used_search_results: layer
			.max_used_search_results
			.unwrap_or(DEFAULT_MAX_USED_SEARCH_RESULTS),
		generation_preset: layer
			.generation_preset
			.unwrap_or_else(|| DEFAULT_GENERATION_PRESET.to_string()),
		reranker: match layer.reranker {
			Some(name) if name.trim().is_empty() => None,
			Some(name) => Some(name),
			None => Some(DEFAULT_RERANKER.to_string()),
		},
	}
}

fn build_retry_settings(layer: Option<RetryLayer>) -> RetrySettings {
	let layer = layer.unwrap_or_default();
	let defaults = RetrySettings::default();
	RetrySettings {
		max_attempts: layer.max_attempts.unwrap_or(defaults.max_attempts),
		base_delay: layer
			.base_delay_ms
			.map(Duration::from_millis)
			.unwrap_or(defaults.base_delay),
		max_delay: layer
			.max_delay_ms
			.map(Duration::from_millis)
			.unwrap_or(defaults.max_delay),
		backoff_factor: layer.backoff_factor.unwrap_or(defaults.backoff_factor),
		jitter: layer.jitter.unwrap_or(defaults.jitter),
	}
}

fn build_logging_config(layer: Option<LoggingLayer>) -> Result<LoggingConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	Ok(LoggingConfig {
		level: layer.level.as_deref().map(str::parse::<LogLevel>).transpose()?.unwrap_or_default(),
		format: layer.format.as_deref().map(str::parse::<LogFormat>).transpose()?.unwrap_or_default(),
	})
}
