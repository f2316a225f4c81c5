// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration registry: collects sources and merges their layers.

use tracing::{debug, info};

use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;
use crate::runtime::DocgateConfig;
use crate::sources::ConfigSource;
use crate::validation::validate_config;
use crate::ConfigError;

#[derive(Default)]
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		debug!(source = source.name(), precedence = ?source.precedence(), "registering config source");
		self.sources.push(source);
	}

	pub fn source_count(&self) -> usize {
		self.sources.len()
	}

	/// Loads every source lowest precedence first, merges, builds and
	/// validates. A source that fails to load fails the whole load; missing
	/// optional files are not failures.
	pub fn load(&self, paths: PathsConfig) -> Result<DocgateConfig, ConfigError> {
		let mut sorted: Vec<_> = self.sources.iter().collect();
		sorted.sort_by_key(|s| s.precedence());

		let mut merged = ConfigLayer::default();
		for source in sorted {
			debug!(source = source.name(), "merging config layer");
			merged.merge(source.load()?);
		}

		let config = DocgateConfig::from_layer(merged, paths)?;
		validate_config(&config)?;

		info!(
			base_url = %config.backend.base_url,
			corpus_key = ?config.backend.corpus_key,
			group_match = %config.acl.group_match,
			directory_users = config.directory.users.len(),
			"configuration loaded"
		);

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::BackendLayer;
	use crate::sources::{DefaultsSource, FileSource, Precedence};
	use std::io::Write;
	use tempfile::NamedTempFile;

	struct FixedSource {
		precedence: Precedence,
		corpus_key: &'static str,
	}

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<ConfigLayer, ConfigError> {
			Ok(ConfigLayer {
				backend: Some(BackendLayer {
					corpus_key: Some(self.corpus_key.to_string()),
					..Default::default()
				}),
				..Default::default()
			})
		}
	}

	#[test]
	fn defaults_alone_load() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		assert_eq!(registry.source_count(), 1);

		let config = registry.load(PathsConfig::default()).unwrap();
		assert!(config.backend.corpus_key.is_none());
	}

	#[test]
	fn higher_precedence_wins_regardless_of_registration_order() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(FixedSource {
			precedence: Precedence::Cli,
			corpus_key: "from-cli",
		}));
		registry.register(Box::new(FixedSource {
			precedence: Precedence::UserFile,
			corpus_key: "from-user-file",
		}));

		let config = registry.load(PathsConfig::default()).unwrap();
		assert_eq!(config.backend.corpus_key.as_deref(), Some("from-cli"));
	}

	#[test]
	fn invalid_file_values_fail_validation() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[retry]\nmax_attempts = 0").unwrap();

		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(FileSource::explicit(file.path().to_path_buf())));

		assert!(matches!(
			registry.load(PathsConfig::default()),
			Err(ConfigError::InvalidValue { .. })
		));
	}
}
