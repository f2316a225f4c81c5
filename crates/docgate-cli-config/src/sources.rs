// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, files, environment, CLI.

use std::path::PathBuf;

use docgate_acl::GroupMatchMode;
use docgate_common_config::load_secret_env_any;
use tracing::{debug, trace};

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	ExplicitFile = 40,
	Environment = 50,
	Cli = 60,
}

pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	fn precedence(&self) -> Precedence;

	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults. Returns an empty layer; defaults are applied when the
/// runtime config is built.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		Ok(ConfigLayer::default())
	}
}

/// A TOML config file.
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
	required: bool,
}

impl FileSource {
	pub fn system(paths: &PathsConfig) -> Self {
		Self {
			path: paths.system_config_file.clone(),
			precedence: Precedence::SystemFile,
			name: "system-config",
			required: false,
		}
	}

	pub fn user(paths: &PathsConfig) -> Self {
		Self {
			path: paths.user_config_file.clone(),
			precedence: Precedence::UserFile,
			name: "user-config",
			required: false,
		}
	}

	/// A file named on the command line. Unlike the well-known locations it
	/// must exist.
	pub fn explicit(path: PathBuf) -> Self {
		Self {
			path,
			precedence: Precedence::ExplicitFile,
			name: "explicit-config",
			required: true,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
			path: self.path.clone(),
			source,
		})?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: self.path.clone(),
			source,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Environment variables.
///
/// `DOCGATE_API_KEY` and `DOCGATE_CORPUS_KEY` fall back to `PERSONAL_API_KEY`
/// and `CORPUS_KEY`. The API key may also come from a file named by the
/// `*_FILE` variant of either name.
pub struct EnvSource;

pub const API_KEY_VARS: [&str; 2] = ["DOCGATE_API_KEY", "PERSONAL_API_KEY"];
pub const CORPUS_KEY_VARS: [&str; 2] = ["DOCGATE_CORPUS_KEY", "CORPUS_KEY"];

fn env_value(name: &str) -> Option<String> {
	std::env::var(name)
		.ok()
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
	value
		.parse()
		.map_err(|_| ConfigError::invalid_value(name, format!("cannot parse '{value}'")))
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = ConfigLayer::default();

		if let Some(secret) = load_secret_env_any(&API_KEY_VARS)? {
			trace!("loaded API key from environment");
			backend(&mut layer).api_key = Some(secret);
		}

		if let Some(corpus_key) = CORPUS_KEY_VARS.iter().find_map(|v| env_value(v)) {
			backend(&mut layer).corpus_key = Some(corpus_key);
		}

		if let Some(v) = env_value("DOCGATE_BASE_URL") {
			backend(&mut layer).base_url = Some(v);
		}
		if let Some(v) = env_value("DOCGATE_TIMEOUT_SECS") {
			backend(&mut layer).timeout_secs = Some(parse_env("DOCGATE_TIMEOUT_SECS", &v)?);
		}
		if let Some(v) = env_value("DOCGATE_GROUP_MATCH") {
			let mode: GroupMatchMode = v
				.parse()
				.map_err(|message: String| ConfigError::invalid_value("DOCGATE_GROUP_MATCH", message))?;
			layer.acl.get_or_insert_with(AclLayer::default).group_match = Some(mode);
		}
		if let Some(v) = env_value("DOCGATE_RETRY_MAX_ATTEMPTS") {
			layer.retry.get_or_insert_with(RetryLayer::default).max_attempts =
				Some(parse_env("DOCGATE_RETRY_MAX_ATTEMPTS", &v)?);
		}
		if let Some(v) = env_value("DOCGATE_LOG_LEVEL") {
			layer.logging.get_or_insert_with(LoggingLayer::default).level = Some(v);
		}
		if let Some(v) = env_value("DOCGATE_LOG_FORMAT") {
			layer.logging.get_or_insert_with(LoggingLayer::default).format = Some(v);
		}

		Ok(layer)
	}
}

fn backend(layer: &mut ConfigLayer) -> &mut BackendLayer {
	layer.backend.get_or_insert_with(BackendLayer::default)
}

/// Command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub config_file: Option<PathBuf>,
	pub base_url: Option<String>,
	pub corpus_key: Option<String>,
	pub timeout_secs: Option<u64>,
	pub group_match: Option<GroupMatchMode>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
}

pub struct CliSource {
	overrides: CliOverrides,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let o = &self.overrides;
		let mut layer = ConfigLayer::default();

		if o.base_url.is_some() || o.corpus_key.is_some() || o.timeout_secs.is_some() {
			layer.backend = Some(BackendLayer {
				base_url: o.base_url.clone(),
				corpus_key: o.corpus_key.clone(),
				timeout_secs: o.timeout_secs,
				..Default::default()
			});
		}
		if o.group_match.is_some() {
			layer.acl = Some(AclLayer {
				group_match: o.group_match,
			});
		}
		if o.log_level.is_some() || o.log_format.is_some() {
			layer.logging = Some(LoggingLayer {
				level: o.log_level.clone(),
				format: o.log_format.clone(),
			});
		}

		Ok(layer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn precedence_ordering() {
		assert!(Precedence::Cli > Precedence::Environment);
		assert!(Precedence::Environment > Precedence::ExplicitFile);
		assert!(Precedence::ExplicitFile > Precedence::UserFile);
		assert!(Precedence::UserFile > Precedence::SystemFile);
		assert!(Precedence::SystemFile > Precedence::Defaults);
	}

	#[test]
	fn missing_optional_file_is_empty() {
		let paths = PathsConfig {
			user_config_file: "/nonexistent/docgate/config.toml".into(),
			..Default::default()
		};
		let layer = FileSource::user(&paths).load().unwrap();
		assert!(layer.backend.is_none());
	}

	#[test]
	fn missing_explicit_file_is_an_error() {
		let err = FileSource::explicit("/nonexistent/docgate/config.toml".into())
			.load()
			.unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}

	#[test]
	fn malformed_file_reports_path() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[backend\nbase_url = ").unwrap();

		let err = FileSource::explicit(file.path().to_path_buf())
			.load()
			.unwrap_err();
		match err {
			ConfigError::TomlParse { path, .. } => assert_eq!(path, file.path()),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn cli_overrides_only_set_fields() {
		let layer = CliSource::new(CliOverrides {
			corpus_key: Some("acl-demo".into()),
			group_match: Some(GroupMatchMode::PresenceOnly),
			..Default::default()
		})
		.load()
		.unwrap();

		let backend = layer.backend.unwrap();
		assert_eq!(backend.corpus_key.as_deref(), Some("acl-demo"));
		assert!(backend.base_url.is_none());
		assert!(layer.logging.is_none());
		assert_eq!(
			layer.acl.unwrap().group_match,
			Some(GroupMatchMode::PresenceOnly)
		);
	}

	// The only test in this crate that touches DOCGATE_* variables.
	#[test]
	fn environment_layer() {
		for var in [
			"DOCGATE_API_KEY",
			"DOCGATE_API_KEY_FILE",
			"PERSONAL_API_KEY_FILE",
			"DOCGATE_CORPUS_KEY",
		] {
			std::env::remove_var(var);
		}
		std::env::set_var("PERSONAL_API_KEY", "zqk-legacy");
		std::env::set_var("CORPUS_KEY", "legacy-corpus");
		std::env::set_var("DOCGATE_TIMEOUT_SECS", "12");
		std::env::set_var("DOCGATE_GROUP_MATCH", "presence_only");

		let layer = EnvSource.load().unwrap();
		let backend = layer.backend.clone().unwrap();
		assert_eq!(backend.api_key.unwrap().expose(), "zqk-legacy");
		assert_eq!(backend.corpus_key.as_deref(), Some("legacy-corpus"));
		assert_eq!(backend.timeout_secs, Some(12));
		assert_eq!(
			layer.acl.unwrap().group_match,
			Some(GroupMatchMode::PresenceOnly)
		);

		std::env::set_var("DOCGATE_CORPUS_KEY", "preferred");
		std::env::set_var("DOCGATE_TIMEOUT_SECS", "soon");
		let err = EnvSource.load().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "DOCGATE_TIMEOUT_SECS"));

		std::env::remove_var("DOCGATE_TIMEOUT_SECS");
		let layer = EnvSource.load().unwrap();
		assert_eq!(
			layer.backend.unwrap().corpus_key.as_deref(),
			Some("preferred")
		);

		for var in [
			"PERSONAL_API_KEY",
			"CORPUS_KEY",
			"DOCGATE_CORPUS_KEY",
			"DOCGATE_GROUP_MATCH",
		] {
			std::env::remove_var(var);
		}
	}
}
