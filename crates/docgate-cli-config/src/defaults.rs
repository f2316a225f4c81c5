// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Starter configuration file.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ConfigError;

/// Written by `docgate init-config`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"#
# docgate configuration
# Location: ~/.config/docgate/config.toml
#

[backend]
base_url = "https://api.vectara.io"
# Prefer DOCGATE_CORPUS_KEY (or CORPUS_KEY) in the environment.
# corpus_key = "acl-demo"
# Prefer DOCGATE_API_KEY (or PERSONAL_API_KEY), or DOCGATE_API_KEY_FILE.
# api_key = "zqk-..."
timeout_secs = 30
max_used_search_results = 5
generation_preset = "mockingbird-1.0-2024-07-16"
# Set to "" to disable reranking.
reranker = "Rerank_Multilingual_v1"

[acl]
# require_membership: users with no groups never match through groups.
# presence_only: users with no groups match any document that has groups.
group_match = "require_membership"

[logging]
# error, warn, info, debug, trace
level = "warn"
# pretty, compact, json
format = "pretty"

[retry]
max_attempts = 3
base_delay_ms = 200
max_delay_ms = 5000
backoff_factor = 2.0
jitter = true

# Users known to this installation. Without any, the built-in sample
# directory is used.
#
# [directory.users.eliza]
# groups = ["physics"]
# roles = ["dean"]
"#;

/// Writes the template to `path`, creating parent directories.
///
/// Returns `false` without touching the file if it exists and `force` is unset.
pub fn write_default_config(path: &Path, force: bool) -> Result<bool, ConfigError> {
	if path.exists() && !force {
		debug!(path = %path.display(), "config file already exists");
		return Ok(false);
	}

	let io_err = |source| ConfigError::Io {
		path: path.to_path_buf(),
		source,
	};

	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).map_err(io_err)?;
	}
	fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(io_err)?;

	info!(path = %path.display(), "wrote default config");
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;
	use crate::runtime::DocgateConfig;
	use crate::validation::validate_config;

	#[test]
	fn template_is_a_valid_config() {
		let layer: ConfigLayer = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
		let config = DocgateConfig::from_layer(layer, PathsConfig::default()).unwrap();
		validate_config(&config).unwrap();
		assert!(config.directory.is_empty());
	}

	#[test]
	fn existing_file_is_kept_unless_forced() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/config.toml");

		assert!(write_default_config(&path, false).unwrap());
		fs::write(&path, "# mine\n").unwrap();

		assert!(!write_default_config(&path, false).unwrap());
		assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

		assert!(write_default_config(&path, true).unwrap());
		assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);
	}
}
